use std::sync::Arc;

use mailer::{DigestRenderer, DirectorySink, DEFAULT_SUBJECT};
use tracker::{
    DigestPage, DigestSink, ReleaseGuid, ReleaseItem, RepositoryDigestGroup, RepositoryName,
    RepositoryRecord, SinkError,
};

fn page(number: usize, count: usize, content: &str) -> DigestPage {
    DigestPage {
        number,
        count,
        groups: vec![RepositoryDigestGroup {
            repository: Arc::new(RepositoryRecord {
                name: "tokio".into(),
                full_name: RepositoryName::new("tokio-rs/tokio").unwrap(),
                description: None,
                html_url: "https://github.com/tokio-rs/tokio".into(),
                forks_count: 1,
                stargazers_count: 2,
                watchers_count: 3,
            }),
            releases: vec![ReleaseItem {
                guid: ReleaseGuid::new(format!("guid-{number}")).unwrap(),
                title: format!("release {number}"),
                link: None,
                published: None,
                content: content.to_string(),
            }],
        }],
    }
}

fn sink(dir: &std::path::Path) -> DirectorySink {
    DirectorySink::new(dir, DigestRenderer::new(DEFAULT_SUBJECT).unwrap())
}

#[tokio::test]
async fn each_page_lands_in_its_own_numbered_file() {
    let dir = tempfile::tempdir().unwrap();
    let sink = sink(dir.path());

    sink.deliver(&page(1, 2, "<p>first</p>")).await.unwrap();
    sink.deliver(&page(2, 2, "<p>second</p>")).await.unwrap();

    let first = std::fs::read_to_string(dir.path().join("digest-001.html")).unwrap();
    let second = std::fs::read_to_string(dir.path().join("digest-002.html")).unwrap();
    assert!(first.contains("<p>first</p>"));
    assert!(second.contains("<p>second</p>"));
    assert!(second.contains("Page 2 of 2"));
}

#[tokio::test]
async fn missing_output_directory_is_created() {
    let dir = tempfile::tempdir().unwrap();
    let sink = sink(&dir.path().join("out").join("digests"));

    sink.deliver(&page(1, 1, "")).await.unwrap();

    assert!(dir.path().join("out/digests/digest-001.html").exists());
}

#[tokio::test]
async fn unwritable_target_is_a_delivery_error() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "a file, not a directory").unwrap();

    let result = sink(&blocker).deliver(&page(1, 1, "")).await;

    assert!(matches!(result, Err(SinkError::Delivery(_))));
}
