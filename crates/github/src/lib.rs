//! StarWatch GitHub infrastructure adapter.
//!
//! Implements the forge-facing traits defined in the [`tracker`] crate
//! ([`tracker::StarredRepositorySource`], [`tracker::ReleaseFeedSource`]) on
//! top of `reqwest`.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** This crate must not contain domain rules.
//! All GitHub details (URLs, headers, pagination parameters, JSON and Atom
//! wire formats, rate-limit headers) are handled here; the [`tracker`] crate
//! never sees them.
//!
//! ## Endpoints
//!
//! | Port | Request |
//! |------|---------|
//! | Starred listing | `GET {api}/users/{user}/starred?per_page=100&page=N` (token auth) |
//! | Release feed | `GET {html_url}/releases.atom` |
//!
//! Every request carries a 15 second timeout and is never retried; a failure
//! is reported through the port's error type and handled by the runner.

pub mod atom;
pub mod client;
pub mod rate_limit;
mod starred;

pub use atom::parse_release_feed;
pub use client::{
    release_feed_url, GithubClient, GithubError, GithubSettings, DEFAULT_API_URL, REQUEST_TIMEOUT,
};
pub use rate_limit::RateLimitState;
