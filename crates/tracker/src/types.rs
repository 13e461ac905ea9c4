//! Shared value types for the release-tracking domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! meaningful values with invariants (e.g. a byte budget is strictly positive,
//! a page's byte total matches its releases) and participate in domain
//! computations.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ReleaseGuid, RepositoryName};

// ---------------------------------------------------------------------------
// Repositories
// ---------------------------------------------------------------------------

/// A starred repository as returned by the listing source.
///
/// Immutable once fetched. Identity is [`RepositoryRecord::full_name`]; all
/// other fields are presentation data for the digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRecord {
    /// Short repository name (e.g. `"tokio"`).
    pub name: String,

    /// Globally unique `"owner/name"` identifier.
    pub full_name: RepositoryName,

    /// Free-text description. `None` when the owner never set one.
    pub description: Option<String>,

    /// Canonical web URL of the repository (e.g. `https://github.com/tokio-rs/tokio`).
    ///
    /// The release feed location is derived from this URL.
    pub html_url: String,

    /// Number of forks.
    pub forks_count: u64,

    /// Number of stargazers.
    pub stargazers_count: u64,

    /// Number of watchers.
    pub watchers_count: u64,
}

// ---------------------------------------------------------------------------
// Releases
// ---------------------------------------------------------------------------

/// One entry of a repository's release feed.
///
/// Feeds are ordered newest first; nothing in this crate re-sorts items by
/// [`ReleaseItem::published`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseItem {
    /// Unique identifier of the entry within its feed.
    pub guid: ReleaseGuid,

    /// Release title (usually the tag name or release name).
    pub title: String,

    /// Web page of the release, if the feed carries one.
    pub link: Option<String>,

    /// Publication time, if the feed carries one.
    pub published: Option<Timestamp>,

    /// Release notes body, as HTML.
    pub content: String,
}

/// A new release attributed to the repository it belongs to.
///
/// The repository is shared by `Arc` across every release it produced during
/// the run. The content size is computed once here and reused by the packer.
#[derive(Debug, Clone)]
pub struct Release {
    repository: Arc<RepositoryRecord>,
    item: ReleaseItem,
    size_bytes: usize,
}

impl Release {
    /// Attributes `item` to `repository`, measuring its content size in bytes.
    pub fn new(repository: Arc<RepositoryRecord>, item: ReleaseItem) -> Self {
        let size_bytes = item.content.len();
        Self {
            repository,
            item,
            size_bytes,
        }
    }

    /// The owning repository.
    pub fn repository(&self) -> &Arc<RepositoryRecord> {
        &self.repository
    }

    /// The feed entry.
    pub fn item(&self) -> &ReleaseItem {
        &self.item
    }

    /// UTF-8 length of the release content.
    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }
}

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

/// Maximum accumulated content size of one digest page, in bytes.
///
/// A single release larger than the budget is still delivered, alone on its
/// own page; see [`crate::packer::pack`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ByteBudget(usize);

impl ByteBudget {
    /// Creates a [`ByteBudget`], returning `None` for a zero budget.
    #[must_use]
    pub fn new(bytes: usize) -> Option<Self> {
        if bytes > 0 {
            Some(Self(bytes))
        } else {
            None
        }
    }

    /// Returns the budget in bytes.
    pub fn as_usize(self) -> usize {
        self.0
    }

    /// Returns `true` if a page holding `total` bytes is over this budget.
    pub fn is_exceeded_by(self, total: usize) -> bool {
        total > self.0
    }
}

impl std::fmt::Display for ByteBudget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} bytes", self.0)
    }
}

// ---------------------------------------------------------------------------

/// An ordered batch of releases destined for one digest document.
#[derive(Debug, Clone, Default)]
pub struct Page {
    releases: Vec<Release>,
    total_bytes: usize,
}

impl Page {
    /// Creates an empty page.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a release, adding its size to the running total.
    pub fn push(&mut self, release: Release) {
        self.total_bytes += release.size_bytes();
        self.releases.push(release);
    }

    /// Releases in packing order.
    pub fn releases(&self) -> &[Release] {
        &self.releases
    }

    /// Sum of the content sizes of all releases on this page.
    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    /// Number of releases on this page.
    pub fn len(&self) -> usize {
        self.releases.len()
    }

    /// Returns `true` if no release has been pushed yet.
    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }
}

// ---------------------------------------------------------------------------

/// One repository's share of a page, ready for rendering.
///
/// Rebuilt from each [`Page`] by [`crate::digest::assemble`]; never persisted.
#[derive(Debug, Clone)]
pub struct RepositoryDigestGroup {
    /// The repository these releases belong to.
    pub repository: Arc<RepositoryRecord>,

    /// The repository's releases on this page, newest first.
    pub releases: Vec<ReleaseItem>,
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly; the underlying representation can change without affecting the
/// domain API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a [`Timestamp`] from a [`DateTime<Utc>`].
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Parses an RFC 3339 timestamp (the format used by Atom feeds).
    pub fn parse_rfc3339(value: &str) -> Option<Self> {
        DateTime::parse_from_rfc3339(value.trim())
            .ok()
            .map(|dt| Self(dt.with_timezone(&Utc)))
    }

    /// Returns the underlying [`DateTime<Utc>`].
    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}
