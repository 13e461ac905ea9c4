//! StarWatch run orchestration.
//!
//! This crate sequences one tracking run: it lists starred repositories, loads
//! the cursor store, scans release feeds concurrently, packs new releases into
//! byte-bounded pages, hands each page to the digest sink, and finally
//! persists the cursors.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** The runner sequences calls between business logic
//! in the [`tracker`] crate and the infrastructure traits it defines (listing,
//! feeds, cursor persistence, digest sink). It contains no domain rules of its
//! own; its only job beyond sequencing is bounded concurrency.
//!
//! ## Failure policy
//!
//! | Failure | Effect |
//! |---------|--------|
//! | Listing (any page) | Run aborts before any cursor is written |
//! | Cursor read | Empty store, run continues |
//! | One repository's feed | Repository skipped, its cursor untouched |
//! | One page's delivery | Page skipped, other pages and the persist proceed |
//! | Cursor write | Logged, reported in [`RunSummary::cursors_saved`] |

pub mod run;
pub mod scan;

pub use run::{RunSettings, RunSummary, Runner};
pub use scan::{scan_repositories, ScanOutcome};
