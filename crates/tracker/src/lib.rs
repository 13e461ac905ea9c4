//! Core release-tracking domain for StarWatch.
//!
//! This crate contains every domain concept, newtype identifier, shared value
//! type, and error type used to decide *what is new* since the previous run,
//! and to batch it into size-bounded digest pages. Infrastructure crates
//! implement the traits defined here; they never add domain rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`RepositoryName`, `ReleaseGuid`, `RunId`, etc.) |
//! | [`types`] | Value types (`RepositoryRecord`, `ReleaseItem`, `Release`, `Page`, etc.) |
//! | [`errors`] | Port and run-level error types |
//! | [`ports`] | Traits implemented by infrastructure crates |
//! | [`lister`] | Paginated, sorted starred-repository listing |
//! | [`cursor`] | Per-repository "last seen release" store |
//! | [`scanner`] | Novelty detection against a cursor |
//! | [`packer`] | Flattening and greedy byte-budget page packing |
//! | [`digest`] | Per-page regrouping by repository |

pub mod cursor;
pub mod digest;
pub mod errors;
pub mod identifiers;
pub mod lister;
pub mod packer;
pub mod ports;
pub mod scanner;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use cursor::CursorStore;
pub use errors::{FeedError, ListingError, PersistenceError, SinkError, TrackerError};
pub use identifiers::{AccessToken, ReleaseGuid, RepositoryName, RunId, UserLogin};
pub use ports::{
    CursorPersistence, DigestPage, DigestSink, ReleaseFeedSource, StarredRepositorySource,
};
pub use types::{
    ByteBudget, Page, Release, ReleaseItem, RepositoryDigestGroup, RepositoryRecord, Timestamp,
};
