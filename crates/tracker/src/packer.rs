//! Page Packer: flattening per-repository results and greedy size-bounded
//! partitioning into digest pages.

use std::sync::Arc;

use crate::{ByteBudget, Page, Release, ReleaseItem, RepositoryRecord};

/// Flattens scan results into one ordered sequence of [`Release`]s.
///
/// Order is repository order (as given), then each repository's own
/// newest-first order. Nothing is re-sorted.
pub fn flatten<I>(scanned: I) -> Vec<Release>
where
    I: IntoIterator<Item = (Arc<RepositoryRecord>, Vec<ReleaseItem>)>,
{
    scanned
        .into_iter()
        .flat_map(|(repository, items)| {
            items
                .into_iter()
                .map(move |item| Release::new(Arc::clone(&repository), item))
        })
        .collect()
}

/// Greedily partitions `releases` into pages of at most `budget` bytes.
///
/// Input order is preserved. A page is closed just before the release that
/// would push its total strictly over the budget; a total exactly equal to
/// the budget stays on one page. A release larger than the budget on its own
/// is never split: it lands alone on a page that exceeds the budget.
pub fn pack(releases: Vec<Release>, budget: ByteBudget) -> Vec<Page> {
    let mut pages = Vec::new();
    let mut current = Page::new();

    for release in releases {
        if !current.is_empty() && budget.is_exceeded_by(current.total_bytes() + release.size_bytes())
        {
            pages.push(std::mem::take(&mut current));
        }
        current.push(release);
    }

    if !current.is_empty() {
        pages.push(current);
    }

    pages
}
