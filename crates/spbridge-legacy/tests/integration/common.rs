//! Shared test helpers for SharePoint REST integration tests

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use spbridge_auth::{AccessToken, AuthenticationError, Credential, TokenCredential};
use spbridge_core::{RemotePath, SiteUrl};
use spbridge_legacy::{endpoints, LegacyClient, LegacyFileBackend};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN: &str = "test-access-token";
pub const SITE_PATH: &str = "/sites/finance";
pub const LIBRARY: &str = "/sites/finance/Shared Documents";

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

/// Backend for `{server}/sites/finance`
pub fn backend_for(server: &MockServer) -> LegacyFileBackend {
    let site = SiteUrl::parse(&format!("{}{SITE_PATH}", server.uri())).unwrap();
    let client = LegacyClient::new(Credential::new("static", Arc::new(StaticToken)), site).unwrap();
    LegacyFileBackend::new(client)
}

pub async fn setup_legacy_mock() -> (MockServer, LegacyFileBackend) {
    let server = MockServer::start().await;
    let backend = backend_for(&server);
    (server, backend)
}

fn remote(p: &str) -> RemotePath {
    RemotePath::parse(p).unwrap()
}

/// Request path of an `_api/web` endpoint on the test site
fn on_site(endpoint: String) -> String {
    format!("{SITE_PATH}{endpoint}")
}

pub fn folder_api(p: &str) -> String {
    on_site(endpoints::folder(&remote(p)))
}

pub fn file_api(p: &str) -> String {
    on_site(endpoints::file(&remote(p)))
}

pub fn files_api(p: &str) -> String {
    on_site(endpoints::files_in(&remote(p)))
}

pub fn folders_api(p: &str) -> String {
    on_site(endpoints::folders_in(&remote(p)))
}

pub fn content_api(p: &str) -> String {
    on_site(endpoints::content(&remote(p)))
}

pub fn add_folder_api(p: &str) -> String {
    on_site(endpoints::add_folder(&remote(p)))
}

/// `nometadata` file properties for `{folder}/{name}`
pub fn file_props(folder: &str, name: &str) -> Value {
    json!({
        "Name": name,
        "ServerRelativeUrl": format!("{folder}/{name}"),
        "TimeCreated": "2024-01-15T09:30:00Z",
        "TimeLastModified": "2024-02-01T17:45:12Z",
        "Length": "10",
        "Exists": true,
        "UniqueId": format!("uid-{name}")
    })
}

/// `nometadata` folder properties for `{parent}/{name}`
pub fn folder_props(parent: &str, name: &str, item_count: u64) -> Value {
    json!({
        "Name": name,
        "ServerRelativeUrl": format!("{parent}/{name}"),
        "TimeCreated": "2024-01-15T09:30:00Z",
        "TimeLastModified": "2024-01-15T09:30:00Z",
        "ItemCount": item_count,
        "Exists": true
    })
}

/// SharePoint-style error body
pub fn legacy_error(status: u16, code: &str, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(json!({
        "odata.error": {
            "code": code,
            "message": { "lang": "en-US", "value": message }
        }
    }))
}

pub fn file_not_found() -> ResponseTemplate {
    legacy_error(
        404,
        "-2147024894, System.IO.FileNotFoundException",
        "File Not Found.",
    )
}

/// Mounts `GET {api_path}` answering with `body`
pub async fn mount_get(server: &MockServer, api_path: String, body: Value) {
    Mock::given(method("GET"))
        .and(path(api_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Mounts `GET {api_path}` answering "File Not Found"
pub async fn mount_missing(server: &MockServer, api_path: String) {
    Mock::given(method("GET"))
        .and(path(api_path))
        .respond_with(file_not_found())
        .mount(server)
        .await;
}
