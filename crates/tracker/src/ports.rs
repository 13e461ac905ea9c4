//! Port traits implemented by infrastructure crates.
//!
//! The domain defines *what* it needs from the outside world; the `github`,
//! `state`, and `mailer` crates define *how* to supply it. Every trait is
//! dyn-compatible so the composition root can hand `Arc<dyn …>` values to the
//! runner and tests can substitute in-memory fakes.

use async_trait::async_trait;

use crate::{
    CursorStore, FeedError, ListingError, PersistenceError, ReleaseItem, RepositoryDigestGroup,
    RepositoryRecord, SinkError, UserLogin,
};

/// Paginated source of a user's starred repositories.
#[async_trait]
pub trait StarredRepositorySource: Send + Sync {
    /// Fetches one page of starred repositories.
    ///
    /// `page` is one-based. An empty vector signals the end of the listing.
    async fn fetch_starred_page(
        &self,
        user: &UserLogin,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<RepositoryRecord>, ListingError>;
}

/// Source of per-repository release feeds.
#[async_trait]
pub trait ReleaseFeedSource: Send + Sync {
    /// Fetches and parses the release feed of `repository`.
    ///
    /// Items must be returned newest first, exactly as the feed lists them.
    async fn fetch_release_feed(
        &self,
        repository: &RepositoryRecord,
    ) -> Result<Vec<ReleaseItem>, FeedError>;
}

/// Persistent home of the [`CursorStore`].
#[async_trait]
pub trait CursorPersistence: Send + Sync {
    /// Reads the persisted cursors.
    ///
    /// An absent document is not an error and yields an empty store.
    async fn read(&self) -> Result<CursorStore, PersistenceError>;

    /// Replaces the persisted cursors with `cursors`.
    async fn write(&self, cursors: &CursorStore) -> Result<(), PersistenceError>;
}

/// One packed page, assembled for rendering.
#[derive(Debug, Clone)]
pub struct DigestPage {
    /// One-based position of this page within the run.
    pub number: usize,

    /// Total number of pages produced by the run.
    pub count: usize,

    /// Repository groups sorted by full name.
    pub groups: Vec<RepositoryDigestGroup>,
}

impl DigestPage {
    /// Number of releases across all groups.
    pub fn release_count(&self) -> usize {
        self.groups.iter().map(|g| g.releases.len()).sum()
    }
}

/// Renders and delivers digest pages.
#[async_trait]
pub trait DigestSink: Send + Sync {
    /// Renders `page` and delivers it.
    ///
    /// A failure affects this page only; the runner logs it and continues.
    async fn deliver(&self, page: &DigestPage) -> Result<(), SinkError>;
}
