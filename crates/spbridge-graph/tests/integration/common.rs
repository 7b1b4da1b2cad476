//! Shared test helpers for Graph API integration tests
//!
//! Provides a wiremock server pre-loaded with the site and drive lookups
//! every operation starts with, plus builders for drive-item JSON.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use spbridge_auth::{AccessToken, AuthenticationError, Credential, TokenCredential};
use spbridge_core::SiteUrl;
use spbridge_graph::{GraphClient, GraphFileBackend};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN: &str = "test-access-token";
pub const SITE_ID: &str = "contoso.sharepoint.com,site-guid,web-guid";
pub const DOCS_DRIVE: &str = "drive-docs";
pub const ARCHIVE_DRIVE: &str = "drive-archive";

/// Hands out [`TOKEN`] for every scope
struct StaticToken;

#[async_trait]
impl TokenCredential for StaticToken {
    async fn get_token(&self, _scope: &str) -> Result<AccessToken, AuthenticationError> {
        Ok(AccessToken::new(
            TOKEN,
            chrono::Utc::now() + chrono::Duration::hours(1),
        ))
    }
}

pub fn credential() -> Credential {
    Credential::new("static", Arc::new(StaticToken))
}

/// Sets up a mock server with the site and drives endpoints and returns a
/// backend for `{server}/sites/finance` with a page size of 2.
pub async fn setup_graph_mock() -> (MockServer, GraphFileBackend) {
    let server = MockServer::start().await;
    let uri = server.uri();

    Mock::given(method("GET"))
        .and(path("/sites/127.0.0.1:/sites/finance"))
        .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": SITE_ID,
            "name": "finance",
            "webUrl": format!("{uri}/sites/finance")
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/sites/{SITE_ID}/drives")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [
                {
                    "id": DOCS_DRIVE,
                    "name": "Documents",
                    "driveType": "documentLibrary",
                    "webUrl": format!("{uri}/sites/finance/Shared%20Documents")
                },
                {
                    "id": ARCHIVE_DRIVE,
                    "name": "Archive",
                    "driveType": "documentLibrary",
                    "webUrl": format!("{uri}/sites/finance/Archive")
                }
            ]
        })))
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    (server, backend)
}

pub fn backend_for(server: &MockServer) -> GraphFileBackend {
    let client = GraphClient::with_base_url(credential(), server.uri()).with_page_size(2);
    let site = SiteUrl::parse(&format!("{}/sites/finance", server.uri())).unwrap();
    GraphFileBackend::new(client, site)
}

/// Drive item JSON for a file in `Shared Documents/{parent}`
pub fn file_item(server: &MockServer, parent: &str, name: &str) -> Value {
    json!({
        "id": format!("id-{name}"),
        "name": name,
        "size": 10,
        "createdDateTime": "2024-01-15T09:30:00Z",
        "lastModifiedDateTime": "2024-02-01T17:45:12Z",
        "webUrl": format!("{}/sites/finance/Shared%20Documents/{parent}/{name}", server.uri()),
        "file": { "mimeType": "text/plain" }
    })
}

/// Drive item JSON for a folder in `Shared Documents/{parent}`
pub fn folder_item(server: &MockServer, parent: &str, name: &str, child_count: u64) -> Value {
    let web_path = if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    };
    json!({
        "id": format!("id-{name}"),
        "name": name,
        "size": 0,
        "createdDateTime": "2024-01-15T09:30:00Z",
        "lastModifiedDateTime": "2024-01-15T09:30:00Z",
        "webUrl": format!("{}/sites/finance/Shared%20Documents/{web_path}", server.uri()),
        "folder": { "childCount": child_count }
    })
}

/// Graph-style error body
pub fn graph_error(status: u16, code: &str, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(json!({
        "error": { "code": code, "message": message }
    }))
}

/// Mounts `GET {item}` answering with `body`
pub async fn mount_item(server: &MockServer, item_path: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(item_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Mounts `GET {item}` answering 404
pub async fn mount_missing(server: &MockServer, item_path: &str) {
    Mock::given(method("GET"))
        .and(path(item_path))
        .respond_with(graph_error(404, "itemNotFound", "The resource could not be found."))
        .mount(server)
        .await;
}
