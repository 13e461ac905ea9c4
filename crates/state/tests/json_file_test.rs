use state::JsonFileCursorStore;
use tracker::{CursorPersistence, CursorStore, PersistenceError, ReleaseGuid, RepositoryName};

fn cursors(pairs: &[(&str, &str)]) -> CursorStore {
    pairs
        .iter()
        .map(|(repo, guid)| {
            (
                RepositoryName::new(*repo).unwrap(),
                ReleaseGuid::new(*guid).unwrap(),
            )
        })
        .collect()
}

#[tokio::test]
async fn missing_document_reads_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileCursorStore::new(dir.path().join("latest.json"));

    let loaded = store.read().await.unwrap();

    assert!(loaded.is_empty());
}

#[tokio::test]
async fn written_cursors_read_back_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileCursorStore::new(dir.path().join("latest.json"));
    let original = cursors(&[
        ("tokio-rs/tokio", "tag:github.com,2008:Repository/88591471/tokio-1.38.0"),
        ("serde-rs/serde", "tag:github.com,2008:Repository/1/v1.0.200"),
    ]);

    store.write(&original).await.unwrap();
    let loaded = store.read().await.unwrap();

    assert_eq!(loaded, original);
    assert!(!dir.path().join("latest.json.tmp").exists());
}

#[tokio::test]
async fn document_is_a_flat_object_keyed_by_full_name() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("latest.json");
    let store = JsonFileCursorStore::new(&path);

    store
        .write(&cursors(&[("a/b", "guid-1")]))
        .await
        .unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw, serde_json::json!({"a/b": "guid-1"}));
}

#[tokio::test]
async fn hand_written_document_is_readable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("latest.json");
    std::fs::write(&path, r#"{"octocat/hello":"tag:github.com,2008:Repository/1/v2"}"#).unwrap();

    let loaded = JsonFileCursorStore::new(&path).read().await.unwrap();

    assert_eq!(
        loaded
            .get(&RepositoryName::new("octocat/hello").unwrap())
            .map(|g| g.as_str()),
        Some("tag:github.com,2008:Repository/1/v2")
    );
}

#[tokio::test]
async fn rewrite_replaces_previous_cursors() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileCursorStore::new(dir.path().join("latest.json"));

    store.write(&cursors(&[("a/b", "old"), ("c/d", "x")])).await.unwrap();
    store.write(&cursors(&[("a/b", "new")])).await.unwrap();

    assert_eq!(store.read().await.unwrap(), cursors(&[("a/b", "new")]));
}

#[tokio::test]
async fn nested_directories_are_created_on_write() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileCursorStore::new(dir.path().join("state").join("latest.json"));

    store.write(&cursors(&[("a/b", "g")])).await.unwrap();

    assert_eq!(store.read().await.unwrap().len(), 1);
}

#[tokio::test]
async fn malformed_document_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("latest.json");
    std::fs::write(&path, "not json").unwrap();

    let result = JsonFileCursorStore::new(&path).read().await;

    assert!(matches!(result, Err(PersistenceError::Malformed(_))));
}

#[tokio::test]
async fn malformed_document_loads_as_empty_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("latest.json");
    std::fs::write(&path, "[1, 2, 3]").unwrap();

    let loaded = CursorStore::load(&JsonFileCursorStore::new(&path)).await;

    assert!(loaded.is_empty());
}
