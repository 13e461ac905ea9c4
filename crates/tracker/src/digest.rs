//! Digest Assembler: regroups a page's releases by repository for rendering.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::{Page, ReleaseItem, RepositoryDigestGroup, RepositoryName, RepositoryRecord};

/// Groups the releases of `page` by owning repository.
///
/// Releases keep their page order within a group, whether or not they were
/// adjacent on the page. Groups come out sorted by repository full name; this
/// only affects presentation and never the page's packing order.
pub fn assemble(page: &Page) -> Vec<RepositoryDigestGroup> {
    let mut groups: BTreeMap<&RepositoryName, (Arc<RepositoryRecord>, Vec<ReleaseItem>)> =
        BTreeMap::new();

    for release in page.releases() {
        let repository = release.repository();
        groups
            .entry(&repository.full_name)
            .or_insert_with(|| (Arc::clone(repository), Vec::new()))
            .1
            .push(release.item().clone());
    }

    groups
        .into_values()
        .map(|(repository, releases)| RepositoryDigestGroup {
            repository,
            releases,
        })
        .collect()
}
