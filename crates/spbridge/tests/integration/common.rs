//! One wiremock server playing the token endpoint, Graph and the site

use serde_json::json;
use spbridge::{AuthConfig, BackendPolicy, ClientConfig, SharePointClient, Strategy};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TENANT: &str = "contoso-tenant";
pub const GRAPH_TOKEN: &str = "graph-token";
pub const SITE_TOKEN: &str = "site-token";
pub const SITE_ID: &str = "contoso,site-guid,web-guid";

pub fn auth(server: &MockServer) -> AuthConfig {
    AuthConfig::builder()
        .strategy(Strategy::ClientSecret)
        .tenant_id(TENANT)
        .client_id("app-client-id")
        .client_secret("s3cr3t-value")
        .authority_host(server.uri())
        .build()
        .unwrap()
}

pub fn config(server: &MockServer, policy: BackendPolicy) -> ClientConfig {
    ClientConfig::new(format!("{}/sites/finance", server.uri()))
        .with_backend(policy)
        .with_graph_base_url(server.uri())
        .with_auth(auth(server))
}

/// Token endpoint handing out one token per audience, plus the Graph site
/// and drive lookups
pub async fn setup(policy: BackendPolicy) -> (MockServer, SharePointClient) {
    let server = MockServer::start().await;

    let token = |access_token: &str| {
        ResponseTemplate::new(200).set_body_json(json!({
            "token_type": "Bearer",
            "expires_in": 3599,
            "access_token": access_token
        }))
    };
    Mock::given(method("POST"))
        .and(path(format!("/{TENANT}/oauth2/v2.0/token")))
        .and(body_string_contains("graph.microsoft.com"))
        .respond_with(token(GRAPH_TOKEN))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/{TENANT}/oauth2/v2.0/token")))
        .and(body_string_contains("127.0.0.1"))
        .respond_with(token(SITE_TOKEN))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/sites/127.0.0.1:/sites/finance"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": SITE_ID })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/sites/{SITE_ID}/drives")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{
                "id": "drive-docs",
                "name": "Documents",
                "webUrl": format!("{}/sites/finance/Shared%20Documents", server.uri())
            }]
        })))
        .mount(&server)
        .await;

    let client = SharePointClient::from_config(&config(&server, policy)).unwrap();
    (server, client)
}

/// `nometadata` file properties
pub fn legacy_file(folder: &str, name: &str) -> serde_json::Value {
    json!({
        "Name": name,
        "ServerRelativeUrl": format!("{folder}/{name}"),
        "TimeCreated": "2024-01-15T09:30:00Z",
        "TimeLastModified": "2024-02-01T17:45:12Z"
    })
}
