//! End-to-end runs over in-memory fakes of every port.

use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use runner::{RunSettings, Runner};
use tracker::{
    ByteBudget, CursorPersistence, CursorStore, DigestPage, DigestSink, FeedError, ListingError,
    PersistenceError, ReleaseFeedSource, ReleaseGuid, ReleaseItem, RepositoryName,
    RepositoryRecord, RunId, SinkError, StarredRepositorySource, TrackerError, UserLogin,
};

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

fn repo(full_name: &str) -> RepositoryRecord {
    RepositoryRecord {
        name: full_name.rsplit('/').next().unwrap_or(full_name).to_string(),
        full_name: RepositoryName::new(full_name).unwrap(),
        description: None,
        html_url: format!("https://github.com/{full_name}"),
        forks_count: 0,
        stargazers_count: 0,
        watchers_count: 0,
    }
}

fn item(guid: &str, size: usize) -> ReleaseItem {
    ReleaseItem {
        guid: ReleaseGuid::new(guid).unwrap(),
        title: guid.to_string(),
        link: None,
        published: None,
        content: "x".repeat(size),
    }
}

fn name(s: &str) -> RepositoryName {
    RepositoryName::new(s).unwrap()
}

fn guid(s: &str) -> ReleaseGuid {
    ReleaseGuid::new(s).unwrap()
}

/// One page of repositories, or a failure on the first page.
struct FakeStarred {
    repositories: Vec<RepositoryRecord>,
    fail: bool,
}

#[async_trait]
impl StarredRepositorySource for FakeStarred {
    async fn fetch_starred_page(
        &self,
        _user: &UserLogin,
        page: u32,
        _per_page: u32,
    ) -> Result<Vec<RepositoryRecord>, ListingError> {
        if self.fail {
            return Err(ListingError::Transport {
                page,
                message: "connection reset".into(),
            });
        }
        Ok(if page == 1 {
            self.repositories.clone()
        } else {
            Vec::new()
        })
    }
}

/// Feeds keyed by full name; names in `failing` return an error.
#[derive(Default)]
struct FakeFeeds {
    feeds: Mutex<HashMap<String, Vec<ReleaseItem>>>,
    failing: HashSet<String>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeFeeds {
    fn with(feeds: &[(&str, Vec<ReleaseItem>)]) -> Self {
        Self {
            feeds: Mutex::new(
                feeds
                    .iter()
                    .map(|(n, items)| (n.to_string(), items.clone()))
                    .collect(),
            ),
            ..Self::default()
        }
    }

    fn publish(&self, repository: &str, newest: ReleaseItem) {
        self.feeds
            .lock()
            .unwrap()
            .entry(repository.to_string())
            .or_default()
            .insert(0, newest);
    }
}

#[async_trait]
impl ReleaseFeedSource for FakeFeeds {
    async fn fetch_release_feed(
        &self,
        repository: &RepositoryRecord,
    ) -> Result<Vec<ReleaseItem>, FeedError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(repository.full_name.as_str()) {
            return Err(FeedError::Status(500));
        }
        Ok(self
            .feeds
            .lock()
            .unwrap()
            .get(repository.full_name.as_str())
            .cloned()
            .unwrap_or_default())
    }
}

/// Cursor document held in memory; counts writes.
#[derive(Default)]
struct MemoryPersistence {
    stored: Mutex<Option<CursorStore>>,
    corrupt: bool,
    writes: AtomicUsize,
}

impl MemoryPersistence {
    fn seeded(entries: &[(&str, &str)]) -> Self {
        let store = entries.iter().map(|(n, g)| (name(n), guid(g))).collect();
        Self {
            stored: Mutex::new(Some(store)),
            ..Self::default()
        }
    }

    fn stored(&self) -> CursorStore {
        self.stored.lock().unwrap().clone().unwrap_or_default()
    }
}

#[async_trait]
impl CursorPersistence for MemoryPersistence {
    async fn read(&self) -> Result<CursorStore, PersistenceError> {
        if self.corrupt {
            return Err(PersistenceError::Malformed("trailing characters".into()));
        }
        Ok(self.stored())
    }

    async fn write(&self, cursors: &CursorStore) -> Result<(), PersistenceError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        *self.stored.lock().unwrap() = Some(cursors.clone());
        Ok(())
    }
}

/// Records delivered pages; page numbers in `failing` are rejected.
#[derive(Default)]
struct RecordingSink {
    delivered: Mutex<Vec<DigestPage>>,
    failing: HashSet<usize>,
}

impl RecordingSink {
    /// `(repository, guid)` pairs in the order they were delivered.
    fn delivered_releases(&self) -> Vec<(String, String)> {
        self.delivered
            .lock()
            .unwrap()
            .iter()
            .flat_map(|page| page.groups.clone())
            .flat_map(|group| {
                let repo = group.repository.full_name.to_string();
                group
                    .releases
                    .into_iter()
                    .map(move |r| (repo.clone(), r.guid.to_string()))
            })
            .collect()
    }
}

#[async_trait]
impl DigestSink for RecordingSink {
    async fn deliver(&self, page: &DigestPage) -> Result<(), SinkError> {
        if self.failing.contains(&page.number) {
            return Err(SinkError::Delivery("550 mailbox unavailable".into()));
        }
        self.delivered.lock().unwrap().push(page.clone());
        Ok(())
    }
}

struct Harness {
    feeds: Arc<FakeFeeds>,
    persistence: Arc<MemoryPersistence>,
    sink: Arc<RecordingSink>,
    runner: Runner,
}

fn harness(
    starred: FakeStarred,
    feeds: FakeFeeds,
    persistence: MemoryPersistence,
    sink: RecordingSink,
    budget: usize,
    concurrency: usize,
) -> Harness {
    let feeds = Arc::new(feeds);
    let persistence = Arc::new(persistence);
    let sink = Arc::new(sink);
    let runner = Runner::new(
        Arc::new(starred),
        feeds.clone(),
        persistence.clone(),
        sink.clone(),
        RunSettings {
            user: UserLogin::new("octocat").unwrap(),
            page_budget: ByteBudget::new(budget).unwrap(),
            max_concurrent_scans: NonZeroUsize::new(concurrency).unwrap(),
        },
    );
    Harness {
        feeds,
        persistence,
        sink,
        runner,
    }
}

fn starred(names: &[&str]) -> FakeStarred {
    FakeStarred {
        repositories: names.iter().map(|n| repo(n)).collect(),
        fail: false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_repository_is_isolated_from_the_rest() {
    let mut feeds = FakeFeeds::with(&[
        ("a/a", vec![item("a2", 1), item("a1", 1)]),
        ("b/b", vec![item("b2", 1), item("b1", 1)]),
        ("c/c", vec![item("c1", 1)]),
    ]);
    feeds.failing.insert("b/b".into());
    let h = harness(
        starred(&["c/c", "b/b", "a/a"]),
        feeds,
        MemoryPersistence::seeded(&[("a/a", "a1"), ("b/b", "b1")]),
        RecordingSink::default(),
        1024,
        4,
    );

    let summary = h.runner.run(RunId::new_random()).await.unwrap();

    assert_eq!(summary.repositories, 3);
    assert_eq!(summary.failed_repositories, vec![name("b/b")]);
    assert_eq!(summary.new_releases, 2);
    assert_eq!(
        h.sink.delivered_releases(),
        vec![
            ("a/a".to_string(), "a2".to_string()),
            ("c/c".to_string(), "c1".to_string()),
        ]
    );

    let stored = h.persistence.stored();
    assert_eq!(stored.get(&name("a/a")), Some(&guid("a2")));
    assert_eq!(stored.get(&name("b/b")), Some(&guid("b1")));
    assert_eq!(stored.get(&name("c/c")), Some(&guid("c1")));
    assert!(summary.cursors_saved);
}

#[tokio::test]
async fn second_run_without_upstream_changes_finds_nothing() {
    let h = harness(
        starred(&["a/a", "b/b"]),
        FakeFeeds::with(&[
            ("a/a", vec![item("a2", 3), item("a1", 3)]),
            ("b/b", vec![item("b1", 3)]),
        ]),
        MemoryPersistence::default(),
        RecordingSink::default(),
        1024,
        2,
    );

    let first = h.runner.run(RunId::new_random()).await.unwrap();
    let after_first = h.persistence.stored();
    let second = h.runner.run(RunId::new_random()).await.unwrap();

    assert_eq!(first.new_releases, 3);
    assert_eq!(first.pages, 1);
    assert_eq!(second.new_releases, 0);
    assert_eq!(second.pages, 0);
    assert_eq!(second.advanced_cursors, 0);
    assert_eq!(h.persistence.stored(), after_first);

    // A release published between runs is the only thing reported next time.
    h.feeds.publish("b/b", item("b2", 3));
    let third = h.runner.run(RunId::new_random()).await.unwrap();
    assert_eq!(third.new_releases, 1);
    assert_eq!(h.persistence.stored().get(&name("b/b")), Some(&guid("b2")));
}

#[tokio::test]
async fn listing_failure_aborts_before_cursors_are_written() {
    let h = harness(
        FakeStarred {
            repositories: vec![repo("a/a")],
            fail: true,
        },
        FakeFeeds::with(&[("a/a", vec![item("a1", 1)])]),
        MemoryPersistence::seeded(&[("a/a", "a0")]),
        RecordingSink::default(),
        1024,
        1,
    );

    let err = h.runner.run(RunId::new_random()).await.unwrap_err();

    assert!(matches!(err, TrackerError::Listing(ListingError::Transport { page: 1, .. })));
    assert_eq!(h.persistence.writes.load(Ordering::SeqCst), 0);
    assert_eq!(h.persistence.stored().get(&name("a/a")), Some(&guid("a0")));
    assert!(h.sink.delivered.lock().unwrap().is_empty());
}

#[tokio::test]
async fn failed_page_does_not_block_other_pages_or_the_persist() {
    let mut sink = RecordingSink::default();
    sink.failing.insert(1);
    let h = harness(
        starred(&["a/a", "b/b"]),
        FakeFeeds::with(&[("a/a", vec![item("a1", 5)]), ("b/b", vec![item("b1", 5)])]),
        MemoryPersistence::default(),
        sink,
        5,
        2,
    );

    let summary = h.runner.run(RunId::new_random()).await.unwrap();

    assert_eq!(summary.pages, 2);
    assert_eq!(summary.failed_pages, vec![1]);
    assert_eq!(
        h.sink.delivered_releases(),
        vec![("b/b".to_string(), "b1".to_string())]
    );
    assert!(summary.cursors_saved);
    // The failed page's release is still marked seen.
    assert_eq!(h.persistence.stored().get(&name("a/a")), Some(&guid("a1")));
}

#[tokio::test]
async fn pages_follow_repository_then_feed_order_within_budget() {
    let h = harness(
        starred(&["b/b", "a/a"]),
        FakeFeeds::with(&[
            ("a/a", vec![item("a3", 3), item("a2", 3), item("a1", 3)]),
            ("b/b", vec![item("b1", 4)]),
        ]),
        MemoryPersistence::default(),
        RecordingSink::default(),
        7,
        2,
    );

    let summary = h.runner.run(RunId::new_random()).await.unwrap();

    // Sizes in order: a3=3, a2=3, a1=3, b1=4 → [a3, a2] [a1, b1]
    assert_eq!(summary.pages, 2);
    let delivered = h.sink.delivered.lock().unwrap();
    assert_eq!(delivered[0].number, 1);
    assert_eq!(delivered[0].count, 2);
    assert_eq!(delivered[0].release_count(), 2);
    let second: Vec<&str> = delivered[1]
        .groups
        .iter()
        .map(|g| g.repository.full_name.as_str())
        .collect();
    assert_eq!(second, ["a/a", "b/b"]);
}

#[tokio::test]
async fn unreadable_cursor_store_treats_every_release_as_new() {
    let persistence = MemoryPersistence {
        corrupt: true,
        ..MemoryPersistence::default()
    };
    let h = harness(
        starred(&["a/a"]),
        FakeFeeds::with(&[("a/a", vec![item("a2", 1), item("a1", 1)])]),
        persistence,
        RecordingSink::default(),
        1024,
        1,
    );

    let summary = h.runner.run(RunId::new_random()).await.unwrap();

    assert_eq!(summary.new_releases, 2);
    assert_eq!(h.persistence.writes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn scans_never_exceed_the_concurrency_limit() {
    let names: Vec<String> = (0..8).map(|i| format!("o/r{i}")).collect();
    let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let mut feeds = FakeFeeds::default();
    feeds.delay = Some(Duration::from_millis(20));
    let h = harness(
        starred(&name_refs),
        feeds,
        MemoryPersistence::default(),
        RecordingSink::default(),
        1024,
        3,
    );

    let summary = h.runner.run(RunId::new_random()).await.unwrap();

    assert_eq!(summary.repositories, 8);
    assert!(summary.failed_repositories.is_empty());
    let peak = h.feeds.max_in_flight.load(Ordering::SeqCst);
    assert!(peak <= 3, "peak concurrency {peak}");
    assert!(peak >= 1);
}
