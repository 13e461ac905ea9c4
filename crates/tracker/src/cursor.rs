//! Cursor Store: the last release seen for each repository.
//!
//! The store is the only state that outlives a run. Its lifecycle is explicit:
//!
//! 1. [`CursorStore::load`] once before scanning (never fails the run),
//! 2. [`CursorStore::record_scan`] per successfully scanned repository,
//! 3. [`CursorStore::save`] once after delivery (best effort).
//!
//! A cursor only ever moves to the newest item of a successful scan, so it
//! always names a release that was at some point the newest one known for its
//! repository; it never points past a gap.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{CursorPersistence, ReleaseGuid, ReleaseItem, RepositoryName};

/// Mapping from repository full name to the GUID of its last processed release.
///
/// Serialises as a flat JSON-style object (`{"owner/name": "guid"}`); keys are
/// kept sorted so the persisted document is stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CursorStore {
    entries: BTreeMap<RepositoryName, ReleaseGuid>,
}

impl CursorStore {
    /// Creates an empty store (no repository has any history).
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the store from `persistence`.
    ///
    /// A read or parse failure is logged and degrades to an empty store: every
    /// repository is then treated as having no history, which re-reports
    /// releases rather than losing any.
    pub async fn load(persistence: &dyn CursorPersistence) -> Self {
        match persistence.read().await {
            Ok(store) => {
                info!(cursors = store.len(), "loaded release cursors");
                store
            }
            Err(error) => {
                warn!(%error, "unable to read release cursors; starting with none");
                Self::new()
            }
        }
    }

    /// Writes the store to `persistence`, returning whether it succeeded.
    ///
    /// Failure is logged and never propagated.
    pub async fn save(&self, persistence: &dyn CursorPersistence) -> bool {
        match persistence.write(self).await {
            Ok(()) => {
                info!(cursors = self.len(), "saved release cursors");
                true
            }
            Err(error) => {
                warn!(%error, "unable to write release cursors");
                false
            }
        }
    }

    /// The last processed release of `repository`, if any.
    pub fn get(&self, repository: &RepositoryName) -> Option<&ReleaseGuid> {
        self.entries.get(repository)
    }

    /// Records the result of a successful scan of `repository`.
    ///
    /// `new_releases` is the scan result, newest first. The cursor moves to
    /// its first element; an empty result leaves the cursor unchanged.
    /// Returns `true` if the cursor moved.
    pub fn record_scan(&mut self, repository: &RepositoryName, new_releases: &[ReleaseItem]) -> bool {
        let Some(newest) = new_releases.first() else {
            return false;
        };
        debug!(%repository, cursor = %newest.guid, "advancing release cursor");
        self.entries.insert(repository.clone(), newest.guid.clone());
        true
    }

    /// Iterates cursors in repository order.
    pub fn iter(&self) -> impl Iterator<Item = (&RepositoryName, &ReleaseGuid)> {
        self.entries.iter()
    }

    /// Number of repositories with a cursor.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no repository has a cursor yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(RepositoryName, ReleaseGuid)> for CursorStore {
    fn from_iter<I: IntoIterator<Item = (RepositoryName, ReleaseGuid)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
