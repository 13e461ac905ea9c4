//! Release Scanner: novelty detection against a repository's cursor.

use tracing::{info, warn};

use crate::{FeedError, ReleaseFeedSource, ReleaseGuid, ReleaseItem, RepositoryRecord};

/// Returns the prefix of `feed` that is newer than `cursor`.
///
/// `feed` is newest first. Items are collected until one whose GUID equals
/// `cursor`; that item and everything older have already been seen. When no
/// item matches (first run, or the cursor's release was deleted upstream) the
/// whole feed is new.
pub fn new_releases(feed: Vec<ReleaseItem>, cursor: Option<&ReleaseGuid>) -> Vec<ReleaseItem> {
    match cursor {
        Some(cursor) => feed.into_iter().take_while(|item| &item.guid != cursor).collect(),
        None => feed,
    }
}

/// Fetches the release feed of `repository` and keeps only unseen releases.
///
/// Errors are returned to the caller, which decides to skip the repository;
/// nothing here touches the cursor.
pub async fn scan(
    feeds: &dyn ReleaseFeedSource,
    repository: &RepositoryRecord,
    cursor: Option<&ReleaseGuid>,
) -> Result<Vec<ReleaseItem>, FeedError> {
    info!(repository = %repository.full_name, "reading releases");
    let feed = match feeds.fetch_release_feed(repository).await {
        Ok(feed) => feed,
        Err(error) => {
            warn!(repository = %repository.full_name, %error, "unable to read releases");
            return Err(error);
        }
    };

    let feed_len = feed.len();
    let fresh = new_releases(feed, cursor);
    if cursor.is_some() && fresh.len() == feed_len && feed_len > 0 {
        warn!(
            repository = %repository.full_name,
            "stored cursor not found in feed; treating the whole feed as new"
        );
    }
    info!(repository = %repository.full_name, count = fresh.len(), "read releases");
    Ok(fresh)
}
