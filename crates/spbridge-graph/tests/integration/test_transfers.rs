//! Download and upload against a mocked Graph API

use std::path::Path;

use serde_json::json;
use spbridge_core::FileBackend;
use wiremock::matchers::{body_string, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common::{self, DOCS_DRIVE};

#[tokio::test]
async fn test_download_streams_to_destination() {
    let (server, backend) = common::setup_graph_mock().await;

    Mock::given(method("GET"))
        .and(path(format!("/drives/{DOCS_DRIVE}/root:/Reports/q1.csv:/content")))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"region,total\nnorth,42\n".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("nested").join("out").join("q1.csv");

    backend
        .download_file("/sites/finance/Shared Documents/Reports/q1.csv", &destination)
        .await
        .expect("download failed");

    let content = tokio::fs::read(&destination).await.unwrap();
    assert_eq!(content, b"region,total\nnorth,42\n");
}

#[tokio::test]
async fn test_download_missing_file_leaves_destination_untouched() {
    let (server, backend) = common::setup_graph_mock().await;

    Mock::given(method("GET"))
        .and(path(format!("/drives/{DOCS_DRIVE}/root:/Reports/gone.csv:/content")))
        .respond_with(common::graph_error(404, "itemNotFound", "Item not found"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("gone.csv");

    let err = backend
        .download_file("/sites/finance/Shared Documents/Reports/gone.csv", &destination)
        .await
        .unwrap_err();

    assert!(err.is_not_found(), "{err:?}");
    assert!(!destination.exists());
}

#[tokio::test]
async fn test_upload_puts_content_into_existing_folder() {
    let (server, backend) = common::setup_graph_mock().await;

    common::mount_item(
        &server,
        &format!("/drives/{DOCS_DRIVE}/root:/Reports:"),
        common::folder_item(&server, "", "Reports", 0),
    )
    .await;

    Mock::given(method("PUT"))
        .and(path(format!("/drives/{DOCS_DRIVE}/root:/Reports/notes.txt:/content")))
        .and(body_string("hello world"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(common::file_item(&server, "Reports", "notes.txt")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("notes.txt");
    tokio::fs::write(&source, b"hello world").await.unwrap();

    let record = backend
        .upload_file(&source, "/sites/finance/Shared Documents/Reports")
        .await
        .expect("upload failed");

    assert_eq!(record.name, "notes.txt");
    assert_eq!(
        record.server_relative_path.as_deref(),
        Some("/sites/finance/Shared Documents/Reports/notes.txt")
    );
}

#[tokio::test]
async fn test_upload_into_missing_folder_is_not_found() {
    let (server, backend) = common::setup_graph_mock().await;

    common::mount_missing(&server, &format!("/drives/{DOCS_DRIVE}/root:/Missing:")).await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("notes.txt");
    tokio::fs::write(&source, b"hello").await.unwrap();

    let err = backend
        .upload_file(&source, "/sites/finance/Shared Documents/Missing")
        .await
        .unwrap_err();
    assert!(err.is_not_found(), "{err:?}");
}

#[tokio::test]
async fn test_upload_missing_source_makes_no_request() {
    let (server, backend) = common::setup_graph_mock().await;

    let err = backend
        .upload_file(
            Path::new("/nonexistent/spbridge/notes.txt"),
            "/sites/finance/Shared Documents/Reports",
        )
        .await
        .unwrap_err();

    assert!(err.is_not_found(), "{err:?}");
    let requests = server.received_requests().await.unwrap();
    assert!(requests.is_empty());
}
