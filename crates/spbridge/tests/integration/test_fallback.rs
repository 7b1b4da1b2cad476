//! Backend selection through the public client

use serde_json::json;
use spbridge::{BackendKind, BackendPolicy, Error, FileBackend};
use wiremock::matchers::{header, method, path, path_regex};
use wiremock::{Mock, ResponseTemplate};

use crate::common::{self, GRAPH_TOKEN, SITE_TOKEN};

const ASSETS: &str = "/sites/finance/SiteAssets";
const ASSETS_FILES: &str =
    "/sites/finance/_api/web/GetFolderByServerRelativePath(decodedurl='%2Fsites%2Ffinance%2FSiteAssets')/Files";

#[tokio::test]
async fn test_auto_falls_back_to_rest_for_non_library_paths() -> anyhow::Result<()> {
    let (server, client) = common::setup(BackendPolicy::Auto).await;

    Mock::given(method("GET"))
        .and(path(ASSETS_FILES))
        .and(header("authorization", format!("Bearer {SITE_TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [common::legacy_file(ASSETS, "logo.png")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let files = client.files().list_files_in_folder(ASSETS, false).await?;

    assert_eq!(files.len(), 1);
    assert_eq!(files[0].name, "logo.png");
    Ok(())
}

#[tokio::test]
async fn test_auto_does_not_fall_back_on_not_found() -> anyhow::Result<()> {
    let (server, client) = common::setup(BackendPolicy::Auto).await;

    Mock::given(method("GET"))
        .and(path("/drives/drive-docs/root:/Gone:/children"))
        .and(header("authorization", format!("Bearer {GRAPH_TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "code": "itemNotFound", "message": "Item not found" }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(path_regex("/_api/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client
        .files()
        .list_files_in_folder("/Shared Documents/Gone", false)
        .await
        .unwrap_err();

    assert!(err.is_not_found(), "{err:?}");
    Ok(())
}

#[tokio::test]
async fn test_pinned_graph_reports_unsupported() -> anyhow::Result<()> {
    let (server, client) = common::setup(BackendPolicy::Graph).await;

    Mock::given(path_regex("/_api/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client
        .files()
        .list_files_in_folder(ASSETS, false)
        .await
        .unwrap_err();

    match err {
        Error::Unsupported { operation, backend, .. } => {
            assert_eq!(operation, "list_files_in_folder");
            assert_eq!(backend, BackendKind::Graph);
        }
        other => panic!("expected Unsupported, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn test_pinned_legacy_never_calls_graph() -> anyhow::Result<()> {
    let (server, client) = common::setup(BackendPolicy::Legacy).await;

    Mock::given(method("GET"))
        .and(path(ASSETS_FILES))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let files = client.files().list_files_in_folder(ASSETS, false).await?;
    assert!(files.is_empty());

    let requests = server.received_requests().await.unwrap_or_default();
    assert!(requests.iter().all(|r| !r.url.path().starts_with("/drives")));
    assert!(requests
        .iter()
        .all(|r| r.url.path() != "/sites/127.0.0.1:/sites/finance"));
    Ok(())
}

#[tokio::test]
async fn test_disallowed_character_rejected_without_requests() -> anyhow::Result<()> {
    let (server, client) = common::setup(BackendPolicy::Auto).await;

    let err = client
        .files()
        .folder_exists("/Shared Documents/100%")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Validation(_)), "{err:?}");
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
    Ok(())
}
