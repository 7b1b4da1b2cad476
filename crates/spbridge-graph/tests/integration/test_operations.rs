//! Move, rename, recycle and folder operations against a mocked Graph API

use std::path::Path;

use serde_json::json;
use spbridge_core::{ConflictBehavior, Error, FileBackend};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use crate::common::{self, DOCS_DRIVE};

const LIBRARY: &str = "/sites/finance/Shared Documents";

#[tokio::test]
async fn test_move_patches_parent_reference() {
    let (server, backend) = common::setup_graph_mock().await;

    common::mount_item(
        &server,
        &format!("/drives/{DOCS_DRIVE}/root:/Inbox/a.txt:"),
        common::file_item(&server, "Inbox", "a.txt"),
    )
    .await;
    common::mount_item(
        &server,
        &format!("/drives/{DOCS_DRIVE}/root:/Archive2024:"),
        common::folder_item(&server, "", "Archive2024", 3),
    )
    .await;

    Mock::given(method("PATCH"))
        .and(path(format!("/drives/{DOCS_DRIVE}/root:/Inbox/a.txt:")))
        .and(query_param("@microsoft.graph.conflictBehavior", "fail"))
        .and(body_partial_json(json!({ "parentReference": { "id": "id-Archive2024" } })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(common::file_item(&server, "Archive2024", "a.txt")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let record = backend
        .move_file_to_folder(
            &format!("{LIBRARY}/Inbox/a.txt"),
            &format!("{LIBRARY}/Archive2024"),
            ConflictBehavior::Fail,
        )
        .await
        .expect("move failed");

    assert_eq!(
        record.server_relative_path.as_deref(),
        Some("/sites/finance/Shared Documents/Archive2024/a.txt")
    );
}

#[tokio::test]
async fn test_move_with_replace_sends_replace() {
    let (server, backend) = common::setup_graph_mock().await;

    common::mount_item(
        &server,
        &format!("/drives/{DOCS_DRIVE}/root:/a.txt:"),
        common::file_item(&server, "", "a.txt"),
    )
    .await;
    common::mount_item(
        &server,
        &format!("/drives/{DOCS_DRIVE}/root:/Done:"),
        common::folder_item(&server, "", "Done", 1),
    )
    .await;

    Mock::given(method("PATCH"))
        .and(path(format!("/drives/{DOCS_DRIVE}/root:/a.txt:")))
        .and(query_param("@microsoft.graph.conflictBehavior", "replace"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::file_item(&server, "Done", "a.txt")))
        .expect(1)
        .mount(&server)
        .await;

    backend
        .move_file_to_folder(
            &format!("{LIBRARY}/a.txt"),
            &format!("{LIBRARY}/Done"),
            ConflictBehavior::Replace,
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_move_across_libraries_is_backend_incapable() {
    let (server, backend) = common::setup_graph_mock().await;

    let err = backend
        .move_file_to_folder(
            &format!("{LIBRARY}/a.txt"),
            "/sites/finance/Archive/2023",
            ConflictBehavior::Fail,
        )
        .await
        .unwrap_err();

    assert!(err.is_backend_incapable(), "{err:?}");
    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| r.method.as_str() == "GET"));
}

#[tokio::test]
async fn test_rename_conflict() {
    let (server, backend) = common::setup_graph_mock().await;
    common::mount_item(
        &server,
        &format!("/drives/{DOCS_DRIVE}/root:/Reports/draft.docx:"),
        common::file_item(&server, "Reports", "draft.docx"),
    )
    .await;

    Mock::given(method("PATCH"))
        .and(path(format!("/drives/{DOCS_DRIVE}/root:/Reports/draft.docx:")))
        .and(body_partial_json(json!({ "name": "final.docx" })))
        .respond_with(common::graph_error(409, "nameAlreadyExists", "Name already exists"))
        .expect(1)
        .mount(&server)
        .await;

    let err = backend
        .rename_file(
            &format!("{LIBRARY}/Reports/draft.docx"),
            "final.docx",
            ConflictBehavior::Fail,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Conflict(_)), "{err:?}");
}

#[tokio::test]
async fn test_rename_returns_renamed_record() {
    let (server, backend) = common::setup_graph_mock().await;
    common::mount_item(
        &server,
        &format!("/drives/{DOCS_DRIVE}/root:/Reports/draft.docx:"),
        common::file_item(&server, "Reports", "draft.docx"),
    )
    .await;

    Mock::given(method("PATCH"))
        .and(path(format!("/drives/{DOCS_DRIVE}/root:/Reports/draft.docx:")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(common::file_item(&server, "Reports", "final.docx")),
        )
        .mount(&server)
        .await;

    let record = backend
        .rename_file(
            &format!("{LIBRARY}/Reports/draft.docx"),
            "final.docx",
            ConflictBehavior::Fail,
        )
        .await
        .unwrap();
    assert_eq!(record.name, "final.docx");
}

#[tokio::test]
async fn test_rename_folder_is_not_found() {
    let (server, backend) = common::setup_graph_mock().await;
    common::mount_item(
        &server,
        &format!("/drives/{DOCS_DRIVE}/root:/Reports:"),
        common::folder_item(&server, "", "Reports", 2),
    )
    .await;

    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = backend
        .rename_file(&format!("{LIBRARY}/Reports"), "Old Reports", ConflictBehavior::Fail)
        .await
        .unwrap_err();
    assert!(err.is_not_found(), "{err:?}");
}

#[tokio::test]
async fn test_move_folder_is_not_found() {
    let (server, backend) = common::setup_graph_mock().await;
    common::mount_item(
        &server,
        &format!("/drives/{DOCS_DRIVE}/root:/Reports:"),
        common::folder_item(&server, "", "Reports", 2),
    )
    .await;

    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = backend
        .move_file_to_folder(
            &format!("{LIBRARY}/Reports"),
            &format!("{LIBRARY}/Done"),
            ConflictBehavior::Fail,
        )
        .await
        .unwrap_err();
    assert!(err.is_not_found(), "{err:?}");
}

#[tokio::test]
async fn test_recycle_deletes_item() {
    let (server, backend) = common::setup_graph_mock().await;
    common::mount_item(
        &server,
        &format!("/drives/{DOCS_DRIVE}/root:/old.txt:"),
        common::file_item(&server, "", "old.txt"),
    )
    .await;

    Mock::given(method("DELETE"))
        .and(path(format!("/drives/{DOCS_DRIVE}/root:/old.txt:")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    backend
        .recycle_file(&format!("{LIBRARY}/old.txt"))
        .await
        .expect("recycle failed");
}

#[tokio::test]
async fn test_recycle_missing_file_is_not_found() {
    let (server, backend) = common::setup_graph_mock().await;
    common::mount_missing(&server, &format!("/drives/{DOCS_DRIVE}/root:/old.txt:")).await;

    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let err = backend.recycle_file(&format!("{LIBRARY}/old.txt")).await.unwrap_err();
    assert!(err.is_not_found(), "{err:?}");
}

#[tokio::test]
async fn test_recycle_folder_is_not_found() {
    let (server, backend) = common::setup_graph_mock().await;
    common::mount_item(
        &server,
        &format!("/drives/{DOCS_DRIVE}/root:/Reports:"),
        common::folder_item(&server, "", "Reports", 2),
    )
    .await;

    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let err = backend.recycle_file(&format!("{LIBRARY}/Reports")).await.unwrap_err();
    assert!(err.is_not_found(), "{err:?}");
}

#[tokio::test]
async fn test_create_folder_creates_each_missing_level() {
    let (server, backend) = common::setup_graph_mock().await;

    common::mount_missing(&server, &format!("/drives/{DOCS_DRIVE}/root:/New:")).await;
    common::mount_missing(&server, &format!("/drives/{DOCS_DRIVE}/root:/New/Sub:")).await;

    Mock::given(method("POST"))
        .and(path(format!("/drives/{DOCS_DRIVE}/root/children")))
        .and(body_partial_json(json!({ "name": "New", "folder": {} })))
        .respond_with(ResponseTemplate::new(201).set_body_json(common::folder_item(&server, "", "New", 0)))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("/drives/{DOCS_DRIVE}/root:/New:/children")))
        .and(body_partial_json(json!({ "name": "Sub" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(common::folder_item(&server, "New", "Sub", 0)))
        .expect(1)
        .mount(&server)
        .await;

    let folder = backend
        .create_folder_if_not_exists(&format!("{LIBRARY}/New/Sub"))
        .await
        .expect("create failed");

    assert_eq!(folder.name, "Sub");
    assert_eq!(
        folder.server_relative_path.as_deref(),
        Some("/sites/finance/Shared Documents/New/Sub")
    );
}

#[tokio::test]
async fn test_create_existing_folder_is_idempotent() {
    let (server, backend) = common::setup_graph_mock().await;

    common::mount_item(
        &server,
        &format!("/drives/{DOCS_DRIVE}/root:/Reports:"),
        common::folder_item(&server, "", "Reports", 2),
    )
    .await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let folder = backend
        .create_folder_if_not_exists(&format!("{LIBRARY}/Reports"))
        .await
        .unwrap();
    assert_eq!(folder.name, "Reports");
    assert_eq!(folder.item_count, Some(2));
}

#[tokio::test]
async fn test_create_folder_over_a_file_is_a_conflict() {
    let (server, backend) = common::setup_graph_mock().await;

    common::mount_item(
        &server,
        &format!("/drives/{DOCS_DRIVE}/root:/notes.txt:"),
        common::file_item(&server, "", "notes.txt"),
    )
    .await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let err = backend
        .create_folder_if_not_exists(&format!("{LIBRARY}/notes.txt/Sub"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)), "{err:?}");
}

#[tokio::test]
async fn test_folder_exists() {
    let (server, backend) = common::setup_graph_mock().await;

    common::mount_item(
        &server,
        &format!("/drives/{DOCS_DRIVE}/root:/Reports:"),
        common::folder_item(&server, "", "Reports", 2),
    )
    .await;
    common::mount_item(
        &server,
        &format!("/drives/{DOCS_DRIVE}/root:/a.txt:"),
        common::file_item(&server, "", "a.txt"),
    )
    .await;
    common::mount_missing(&server, &format!("/drives/{DOCS_DRIVE}/root:/Nope:")).await;

    assert!(backend.folder_exists(&format!("{LIBRARY}/Reports")).await.unwrap());
    assert!(!backend.folder_exists(&format!("{LIBRARY}/Nope")).await.unwrap());
    assert!(!backend.folder_exists(&format!("{LIBRARY}/a.txt")).await.unwrap());
}

#[tokio::test]
async fn test_folder_exists_forbidden_is_an_error() {
    let (server, backend) = common::setup_graph_mock().await;

    Mock::given(method("GET"))
        .and(path(format!("/drives/{DOCS_DRIVE}/root:/Secret:")))
        .respond_with(common::graph_error(403, "accessDenied", "Access denied"))
        .mount(&server)
        .await;

    let err = backend.folder_exists(&format!("{LIBRARY}/Secret")).await.unwrap_err();
    assert!(matches!(err, Error::PermissionDenied(_)), "{err:?}");
}

#[tokio::test]
async fn test_hash_in_path_is_rejected_before_any_request() {
    let (server, backend) = common::setup_graph_mock().await;
    let bad = format!("{LIBRARY}/a#b.txt");
    let good = format!("{LIBRARY}/Reports");

    let results = vec![
        backend.list_files_in_folder(&bad, false).await.map(|_| ()),
        backend.list_folders_in_folder(&bad, false).await.map(|_| ()),
        backend.download_file(&bad, Path::new("/tmp/unused")).await,
        backend.upload_file(Path::new("/tmp/unused"), &bad).await.map(|_| ()),
        backend
            .move_file_to_folder(&bad, &good, ConflictBehavior::Fail)
            .await
            .map(|_| ()),
        backend
            .rename_file(&bad, "c.txt", ConflictBehavior::Fail)
            .await
            .map(|_| ()),
        backend.recycle_file(&bad).await,
        backend.create_folder_if_not_exists(&bad).await.map(|_| ()),
        backend.folder_exists(&bad).await.map(|_| ()),
    ];

    for result in results {
        let err = result.unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "{err:?}");
    }
    let requests = server.received_requests().await.unwrap();
    assert!(requests.is_empty());
}
