//! End-to-end flows through `NodeClient` against the in-memory transport.

use super::{record, record_in, Call, MockTransport, UploadOutcome};
use crate::cache::CacheUpdate;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::library::UnshareOutcome;
use crate::model::{Category, FileRecord, ListOrigin, SearchQuery};
use crate::node::{Intent, IntentOutcome, NodeClient};
use crate::search::SearchOutcome;
use crate::transfer::UploadState;
use crate::transport::UploadPayload;
use std::sync::Arc;
use url::Url;

fn node(mock: MockTransport) -> (Arc<MockTransport>, NodeClient<MockTransport>) {
    let mock = Arc::new(mock);
    let node = NodeClient::new(
        mock.clone(),
        Arc::new(|_: &Url| -> Result<()> { Ok(()) }),
        Arc::new(|_: &str| true),
        &ClientConfig::default(),
    )
    .unwrap();
    (mock, node)
}

#[tokio::test]
async fn empty_file_renders_zero_bytes() {
    let (_mock, node) =
        node(MockTransport::new().with_local_files(vec![FileRecord::new("f1", "a.txt", 0)]));

    node.start().await;

    let cards = node.local_cards();
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].size, "0 Bytes");
}

#[tokio::test]
async fn startup_search_lists_every_category() {
    let (_mock, node) = node(MockTransport::new().with_directory(vec![
        record_in("a", "notes.txt", Category::Document),
        record_in("b", "cat.png", Category::Image),
        record_in("c", "clip.mp4", Category::Video),
    ]));

    let report = node.start().await;

    assert_eq!(report.search, Some(SearchOutcome::Applied { sequence: 1, results: 3 }));
    assert_eq!(node.network_cards().len(), 3);
}

#[tokio::test]
async fn category_search_ignores_case() {
    let mut upper = record("a", "cat.png");
    upper.category = Category::parse_lossy("Image");
    let (_mock, node) = node(
        MockTransport::new()
            .with_directory(vec![upper, record_in("b", "cv.pdf", Category::Document)]),
    );

    let outcome = node
        .dispatch(Intent::SearchSubmitted(SearchQuery::new("", "image")))
        .await
        .unwrap();

    assert!(matches!(outcome, IntentOutcome::Searched(SearchOutcome::Applied { results: 1, .. })));
    let cards = node.network_cards();
    assert_eq!(cards[0].id, "a");
}

#[tokio::test]
async fn unshare_refetches_local_files() {
    let (mock, node) = node(
        MockTransport::new().with_local_files(vec![record("f1", "a.txt"), record("f2", "b.txt")]),
    );
    node.start().await;
    let mut updates = node.cache().subscribe();

    let outcome = node
        .dispatch(Intent::UnshareClicked { file_id: "f1".into() })
        .await
        .unwrap();

    assert!(matches!(outcome, IntentOutcome::Unshared(UnshareOutcome::Removed)));
    assert_eq!(mock.count(&Call::Unshare("f1".into())), 1);
    assert_eq!(mock.local_fetches(), 2);
    assert_eq!(updates.recv().await.unwrap(), CacheUpdate::LocalFiles);
    assert!(node.file_details("f1", ListOrigin::Local).is_none());
    assert!(node.file_details("f2", ListOrigin::Local).is_some());
}

#[tokio::test]
async fn upload_lands_in_local_files() {
    let (mock, node) = node(MockTransport::new());
    mock.script_upload(vec![0, 500, 1000], UploadOutcome::Succeed);
    node.start().await;
    assert!(node.local_cards().is_empty());

    let outcome = node
        .dispatch(Intent::UploadDropped(UploadPayload::new("report.pdf", vec![7u8; 1000])))
        .await
        .unwrap();

    match outcome {
        IntentOutcome::Uploaded(session) => {
            assert_eq!(session.state, UploadState::Completed);
            assert_eq!(session.bytes_sent, 1000);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    let local = node.cache().local_files();
    assert_eq!(local.len(), 1);
    assert_eq!(local[0].filename, "report.pdf");
    assert_eq!(mock.local_fetches(), 2);
}

#[tokio::test]
async fn failed_upload_keeps_local_files() {
    let (mock, node) = node(MockTransport::new().with_local_files(vec![record("f1", "a.txt")]));
    mock.script_upload(vec![0, 400], UploadOutcome::Disconnect);
    node.start().await;

    let err = node
        .dispatch(Intent::UploadDropped(UploadPayload::new("big.iso", vec![0u8; 1000])))
        .await
        .unwrap_err();

    assert!(err.is_network());
    assert_eq!(node.cache().local_files().len(), 1);
    let session = node.transfer().current().unwrap();
    assert_eq!(session.state, UploadState::Failed);
    assert!(session.status_string().starts_with("Upload Failed:"));
}
