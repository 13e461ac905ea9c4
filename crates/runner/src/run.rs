//! One complete tracking run.

use std::num::NonZeroUsize;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument, warn};

use tracker::{
    digest, lister, packer, ByteBudget, CursorPersistence, CursorStore, DigestPage, DigestSink,
    Page, ReleaseFeedSource, RepositoryName, RepositoryRecord, RunId, StarredRepositorySource,
    TrackerError, UserLogin,
};

use crate::scan::scan_repositories;

/// Tunables for a run. Validated by the caller before the run starts.
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Whose starred repositories to track.
    pub user: UserLogin,

    /// Maximum content bytes per digest page.
    pub page_budget: ByteBudget,

    /// Maximum number of release feeds fetched at once.
    pub max_concurrent_scans: NonZeroUsize,
}

/// What a run did. Logged by the CLI at the end of every run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Number of starred repositories listed.
    pub repositories: usize,

    /// Repositories whose feed could not be read this run (cursor untouched).
    pub failed_repositories: Vec<RepositoryName>,

    /// Repositories whose cursor moved.
    pub advanced_cursors: usize,

    /// New releases found across all repositories.
    pub new_releases: usize,

    /// Digest pages produced.
    pub pages: usize,

    /// One-based numbers of pages the sink rejected.
    pub failed_pages: Vec<usize>,

    /// Whether the cursor store was written back.
    pub cursors_saved: bool,
}

/// Drives one run: list → load cursors → scan → pack → deliver → persist.
///
/// Infrastructure is injected as trait objects; the runner holds no state
/// between runs other than what the [`CursorPersistence`] keeps.
pub struct Runner {
    starred: Arc<dyn StarredRepositorySource>,
    feeds: Arc<dyn ReleaseFeedSource>,
    persistence: Arc<dyn CursorPersistence>,
    sink: Arc<dyn DigestSink>,
    settings: RunSettings,
}

impl Runner {
    pub fn new(
        starred: Arc<dyn StarredRepositorySource>,
        feeds: Arc<dyn ReleaseFeedSource>,
        persistence: Arc<dyn CursorPersistence>,
        sink: Arc<dyn DigestSink>,
        settings: RunSettings,
    ) -> Self {
        Self {
            starred,
            feeds,
            persistence,
            sink,
            settings,
        }
    }

    /// Executes one run.
    ///
    /// Only a listing failure is returned as an error, and it is returned
    /// before any cursor is written. Feed failures skip their repository,
    /// delivery failures skip their page, and a failed cursor write is
    /// reported in the summary.
    ///
    /// Cursors are advanced in memory right after each scan and written once,
    /// after every page has been handed to the sink. A page whose delivery
    /// fails is therefore not retried by the next run.
    #[instrument(name = "run", skip_all, fields(run_id = %run_id, user = %self.settings.user))]
    pub async fn run(&self, run_id: RunId) -> Result<RunSummary, TrackerError> {
        let repositories = lister::list_starred(self.starred.as_ref(), &self.settings.user).await?;
        info!(count = repositories.len(), "listed starred repositories");

        let mut cursors = CursorStore::load(self.persistence.as_ref()).await;

        // One shared record per repository, allocated before fan-out.
        let repositories: Vec<Arc<RepositoryRecord>> =
            repositories.into_iter().map(Arc::new).collect();

        let outcomes = scan_repositories(
            Arc::clone(&self.feeds),
            &repositories,
            &cursors,
            self.settings.max_concurrent_scans,
        )
        .await;

        let mut summary = RunSummary {
            repositories: repositories.len(),
            ..RunSummary::default()
        };
        let mut scanned = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            match outcome.result {
                Ok(items) => {
                    if cursors.record_scan(&outcome.repository.full_name, &items) {
                        summary.advanced_cursors += 1;
                    }
                    scanned.push((outcome.repository, items));
                }
                Err(_) => summary
                    .failed_repositories
                    .push(outcome.repository.full_name.clone()),
            }
        }

        let releases = packer::flatten(scanned);
        summary.new_releases = releases.len();

        let pages = packer::pack(releases, self.settings.page_budget);
        summary.pages = pages.len();
        info!(
            releases = summary.new_releases,
            pages = summary.pages,
            budget = %self.settings.page_budget,
            "got pages to send"
        );

        summary.failed_pages = self.deliver(&pages).await;
        summary.cursors_saved = cursors.save(self.persistence.as_ref()).await;

        Ok(summary)
    }

    /// Hands every page to the sink in order, returning the numbers of the
    /// pages that failed.
    async fn deliver(&self, pages: &[Page]) -> Vec<usize> {
        let count = pages.len();
        let mut failed = Vec::new();

        for (index, page) in pages.iter().enumerate() {
            let digest_page = DigestPage {
                number: index + 1,
                count,
                groups: digest::assemble(page),
            };
            match self.sink.deliver(&digest_page).await {
                Ok(()) => info!(
                    page = digest_page.number,
                    of = count,
                    releases = page.len(),
                    bytes = page.total_bytes(),
                    "delivered digest page"
                ),
                Err(error) => {
                    warn!(page = digest_page.number, of = count, %error, "unable to deliver digest page");
                    failed.push(digest_page.number);
                }
            }
        }

        failed
    }
}
