//! reqwest-backed GitHub client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use thiserror::Error;
use tracing::{debug, instrument};

use tracker::{
    AccessToken, FeedError, ListingError, ReleaseFeedSource, ReleaseItem, RepositoryRecord,
    StarredRepositorySource, UserLogin,
};

use crate::atom::parse_release_feed;
use crate::rate_limit::RateLimitState;
use crate::starred::parse_starred_page;

/// Public GitHub REST API root.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Timeout applied to every request. Requests are never retried.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

const API_ACCEPT: &str = "application/vnd.github.v3+json";
const FEED_ACCEPT: &str = "application/atom+xml";
const USER_AGENT: &str = concat!("starwatch/", env!("CARGO_PKG_VERSION"));

/// Errors raised while constructing a [`GithubClient`].
#[derive(Debug, Error)]
pub enum GithubError {
    /// The underlying HTTP client could not be built (e.g. TLS backend failure).
    #[error("unable to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Connection settings for [`GithubClient`].
#[derive(Debug, Clone)]
pub struct GithubSettings {
    /// REST API root without a trailing slash.
    pub api_url: String,

    /// Credential sent with every API request.
    pub token: AccessToken,
}

/// GitHub client implementing the listing and release-feed ports.
///
/// Cheap to clone; clones share the connection pool and rate-limit state.
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    api_url: String,
    token: AccessToken,
    rate_limit: RateLimitState,
}

impl GithubClient {
    pub fn new(settings: GithubSettings) -> Result<Self, GithubError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            http,
            api_url: settings.api_url.trim_end_matches('/').to_string(),
            token: settings.token,
            rate_limit: RateLimitState::new(),
        })
    }

    /// Rate-limit state as last reported by the API.
    pub fn rate_limit(&self) -> &RateLimitState {
        &self.rate_limit
    }

    fn starred_url(&self, user: &UserLogin, page: u32, per_page: u32) -> String {
        format!(
            "{}/users/{}/starred?per_page={per_page}&page={page}",
            self.api_url, user
        )
    }
}

/// Location of a repository's release feed.
pub fn release_feed_url(repository: &RepositoryRecord) -> String {
    format!("{}/releases.atom", repository.html_url.trim_end_matches('/'))
}

#[async_trait]
impl StarredRepositorySource for GithubClient {
    #[instrument(skip_all, fields(user = %user, page = page))]
    async fn fetch_starred_page(
        &self,
        user: &UserLogin,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<RepositoryRecord>, ListingError> {
        let url = self.starred_url(user, page, per_page);
        debug!(%url, "requesting starred page");

        let response = self
            .http
            .get(&url)
            .header(AUTHORIZATION, format!("token {}", self.token.expose()))
            .header(ACCEPT, API_ACCEPT)
            .send()
            .await
            .map_err(|e| ListingError::Transport {
                page,
                message: e.to_string(),
            })?;

        self.rate_limit.update_from_headers(response.headers());

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ListingError::Status {
                page,
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| ListingError::Transport {
            page,
            message: e.to_string(),
        })?;

        parse_starred_page(&body).map_err(|message| ListingError::Malformed { page, message })
    }
}

#[async_trait]
impl ReleaseFeedSource for GithubClient {
    #[instrument(skip_all, fields(repository = %repository.full_name))]
    async fn fetch_release_feed(
        &self,
        repository: &RepositoryRecord,
    ) -> Result<Vec<ReleaseItem>, FeedError> {
        let url = release_feed_url(repository);
        debug!(%url, "requesting release feed");

        let response = self
            .http
            .get(&url)
            .header(ACCEPT, FEED_ACCEPT)
            .send()
            .await
            .map_err(|e| FeedError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FeedError::Transport(e.to_string()))?;

        parse_release_feed(&body).map_err(FeedError::Malformed)
    }
}
