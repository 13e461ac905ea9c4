//! Bounded concurrent fan-out of release scans across repositories.
//!
//! Scan tasks share no mutable state. Each one returns `(index, result)` to
//! the single collector in [`scan_repositories`], which restores repository
//! order; cursor updates are applied afterwards by the caller alone.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::{Id, JoinSet};
use tracing::warn;

use tracker::{scanner, CursorStore, FeedError, ReleaseFeedSource, ReleaseItem, RepositoryRecord};

/// Result of scanning one repository.
#[derive(Debug)]
pub struct ScanOutcome {
    /// The scanned repository.
    pub repository: Arc<RepositoryRecord>,

    /// Unseen releases (newest first), or why the repository was skipped.
    pub result: Result<Vec<ReleaseItem>, FeedError>,
}

/// Scans every repository against its cursor, at most `max_concurrency` at a
/// time.
///
/// Outcomes are returned in the same order as `repositories`, one per
/// repository. A task that dies without reporting (panic) is reported as a
/// failed scan for its repository.
pub async fn scan_repositories(
    feeds: Arc<dyn ReleaseFeedSource>,
    repositories: &[Arc<RepositoryRecord>],
    cursors: &CursorStore,
    max_concurrency: NonZeroUsize,
) -> Vec<ScanOutcome> {
    let permits = Arc::new(Semaphore::new(max_concurrency.get()));
    let mut join_set: JoinSet<(usize, Result<Vec<ReleaseItem>, FeedError>)> = JoinSet::new();
    let mut task_index: HashMap<Id, usize> = HashMap::with_capacity(repositories.len());

    for (index, repository) in repositories.iter().enumerate() {
        let permits = Arc::clone(&permits);
        let feeds = Arc::clone(&feeds);
        let repository = Arc::clone(repository);
        let cursor = cursors.get(&repository.full_name).cloned();

        let handle = join_set.spawn(async move {
            // Held until the scan finishes; the semaphore is never closed.
            let _permit = permits.acquire_owned().await;
            let result = scanner::scan(feeds.as_ref(), &repository, cursor.as_ref()).await;
            (index, result)
        });
        task_index.insert(handle.id(), index);
    }

    let mut slots: Vec<Option<Result<Vec<ReleaseItem>, FeedError>>> =
        repositories.iter().map(|_| None).collect();
    while let Some(joined) = join_set.join_next_with_id().await {
        match joined {
            Ok((_, (index, result))) => slots[index] = Some(result),
            Err(error) => match task_index.get(&error.id()) {
                Some(&index) => warn!(
                    repository = %repositories[index].full_name,
                    %error,
                    "scan task panicked"
                ),
                None => warn!(%error, "scan task panicked"),
            },
        }
    }

    repositories
        .iter()
        .zip(slots)
        .map(|(repository, slot)| ScanOutcome {
            repository: Arc::clone(repository),
            result: slot.unwrap_or_else(|| {
                Err(FeedError::Transport("scan task ended without a result".to_string()))
            }),
        })
        .collect()
}
