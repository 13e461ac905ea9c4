//! Repository Lister: turns the paginated starred listing into one complete,
//! deterministically ordered set of repositories.

use tracing::{debug, warn};

use crate::{ListingError, RepositoryRecord, StarredRepositorySource, UserLogin};

/// Page size requested from the listing source.
pub const PER_PAGE: u32 = 100;

/// Fetches every starred repository of `user`, sorted by full name.
///
/// Pages are requested from 1 upward until the first empty page. Any failed
/// page aborts the whole listing; there is no partial result.
///
/// If the listing shifts while it is being paged (a star added or removed
/// mid-listing), a repository can appear on two pages. Only the first
/// occurrence is kept so every full name maps to exactly one record.
pub async fn list_starred(
    source: &dyn StarredRepositorySource,
    user: &UserLogin,
) -> Result<Vec<RepositoryRecord>, ListingError> {
    let mut repositories = Vec::new();
    let mut page = 1;

    loop {
        debug!(%user, page, "reading starred page");
        let batch = source.fetch_starred_page(user, page, PER_PAGE).await?;
        if batch.is_empty() {
            break;
        }
        repositories.extend(batch);
        page += 1;
    }

    Ok(order_repositories(repositories))
}

/// Stable sort by full name, dropping repeated full names.
fn order_repositories(mut repositories: Vec<RepositoryRecord>) -> Vec<RepositoryRecord> {
    repositories.sort_by(|a, b| a.full_name.cmp(&b.full_name));
    repositories.dedup_by(|later, earlier| {
        let duplicate = later.full_name == earlier.full_name;
        if duplicate {
            warn!(repository = %later.full_name, "repository listed twice; keeping first occurrence");
        }
        duplicate
    });
    repositories
}
