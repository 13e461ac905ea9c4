//! GitHub API rate-limit tracking.
//!
//! Reads `X-RateLimit-Remaining` / `X-RateLimit-Reset` (or the standardised
//! `RateLimit-Remaining` / `RateLimit-Reset`) from API responses. Nothing is
//! throttled or retried; the state only feeds warnings so an operator can
//! lower `scan.max_concurrency` before the limit starts failing runs.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use reqwest::header::HeaderMap;
use tracing::{debug, warn};

/// Remaining calls under which every response logs a warning.
pub const LOW_REMAINING_THRESHOLD: u64 = 50;

/// Shared rate-limit state updated after every API response.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    /// Remaining API calls before the rate limit resets.
    remaining: Arc<AtomicU64>,
    /// Unix timestamp at which the rate limit window resets.
    reset_at: Arc<AtomicU64>,
}

impl Default for RateLimitState {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimitState {
    pub fn new() -> Self {
        Self {
            remaining: Arc::new(AtomicU64::new(u64::MAX)),
            reset_at: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Current remaining calls (`u64::MAX` until a response reported one).
    pub fn remaining(&self) -> u64 {
        self.remaining.load(Ordering::Relaxed)
    }

    /// Unix timestamp when the window resets.
    pub fn reset_at(&self) -> u64 {
        self.reset_at.load(Ordering::Relaxed)
    }

    /// Returns `true` once a response reported fewer than
    /// [`LOW_REMAINING_THRESHOLD`] remaining calls.
    pub fn is_low(&self) -> bool {
        self.remaining() < LOW_REMAINING_THRESHOLD
    }

    /// Update state from HTTP response headers, warning when the remaining
    /// budget is low.
    pub fn update_from_headers(&self, headers: &HeaderMap) {
        let remaining = header_u64(headers, "X-RateLimit-Remaining", "RateLimit-Remaining");
        let reset = header_u64(headers, "X-RateLimit-Reset", "RateLimit-Reset");

        if let Some(r) = remaining {
            self.remaining.store(r, Ordering::Relaxed);
        }
        if let Some(r) = reset {
            self.reset_at.store(r, Ordering::Relaxed);
        }

        if self.is_low() {
            warn!(
                remaining = self.remaining(),
                reset_at = self.reset_at(),
                "GitHub API rate limit nearly exhausted"
            );
        } else if remaining.is_some() {
            debug!(remaining = self.remaining(), "GitHub API rate limit");
        }
    }
}

fn header_u64(headers: &HeaderMap, name: &str, fallback: &str) -> Option<u64> {
    headers
        .get(name)
        .or_else(|| headers.get(fallback))
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
}
