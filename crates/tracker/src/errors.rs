//! Error types for the release-tracking domain.
//!
//! [`TrackerError`] covers conditions that end a run. The per-port errors
//! ([`ListingError`], [`FeedError`], [`PersistenceError`], [`SinkError`]) are
//! what infrastructure adapters report through the traits in [`crate::ports`];
//! the orchestrator decides which of them are fatal and which are recovered
//! at their unit boundary (one repository, one page, the final persist).
//!
//! None of these errors is retried automatically: a transient failure simply
//! shows up again on the next run.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Port errors
// ---------------------------------------------------------------------------

/// Failure while fetching one page of the starred-repository listing.
///
/// Always fatal to the run: repository identity drives every later cursor
/// lookup, so a partial listing is unusable.
#[derive(Debug, Error)]
pub enum ListingError {
    /// The request never produced a response (connection, TLS, timeout).
    #[error("listing page {page} request failed: {message}")]
    Transport {
        /// One-based page number.
        page: u32,
        /// Transport error description.
        message: String,
    },

    /// The source answered with a non-success status.
    #[error("listing page {page} returned status {status}")]
    Status {
        /// One-based page number.
        page: u32,
        /// HTTP status code.
        status: u16,
    },

    /// The response body could not be decoded into repository records.
    #[error("listing page {page} is malformed: {message}")]
    Malformed {
        /// One-based page number.
        page: u32,
        /// Decoder error description.
        message: String,
    },
}

/// Failure while fetching or parsing one repository's release feed.
///
/// Recoverable: the repository is skipped for this run and its cursor is left
/// untouched.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The request never produced a response (connection, TLS, timeout).
    #[error("feed request failed: {0}")]
    Transport(String),

    /// The feed endpoint answered with a non-success status.
    #[error("feed returned status {0}")]
    Status(u16),

    /// The feed document could not be parsed.
    #[error("feed is malformed: {0}")]
    Malformed(String),
}

/// Failure while reading or writing the persisted cursor document.
///
/// Never fatal: a failed read degrades to an empty store, a failed write is
/// logged.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The document exists but could not be read or written.
    #[error("cursor document I/O failed: {0}")]
    Io(String),

    /// The document exists but is not a valid cursor mapping.
    #[error("cursor document is malformed: {0}")]
    Malformed(String),
}

/// Failure while rendering or delivering one digest page.
///
/// Recoverable: other pages are still delivered and cursors are still persisted.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The page could not be rendered into a document.
    #[error("digest rendering failed: {0}")]
    Render(String),

    /// The rendered document could not be delivered.
    #[error("digest delivery failed: {0}")]
    Delivery(String),
}

// ---------------------------------------------------------------------------
// Run-level errors
// ---------------------------------------------------------------------------

/// Errors that end a run with a non-zero outcome.
///
/// When one of these is returned, no cursor has been persisted during the run,
/// so the previous state is intact and the run is safe to repeat.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// The starred-repository listing could not be retrieved completely.
    #[error("unable to list starred repositories: {0}")]
    Listing(#[from] ListingError),

    /// The run configuration is invalid.
    ///
    /// Produced at load time; a run never starts with an invalid config.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },
}
