//! Default strategy: environment credentials first, then managed identity

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use spbridge_auth::{get_credential, AuthConfig, TokenCredential};

use crate::common::*;

#[tokio::test]
async fn test_environment_secret_is_tried_first() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "env-token").await;

    let config = AuthConfig::from_vars([
        ("AZURE_TENANT_ID", TENANT.to_string()),
        ("AZURE_CLIENT_ID", CLIENT.to_string()),
        ("AZURE_CLIENT_SECRET", "secret".to_string()),
        ("AZURE_AUTHORITY_HOST", server.uri()),
    ])
    .unwrap();

    let credential = get_credential(&config).unwrap();
    assert_eq!(credential.kind(), "default");

    let token = credential.get_token(GRAPH_SCOPE).await.unwrap();
    assert_eq!(token.secret(), "env-token");
}

#[tokio::test]
async fn test_falls_through_to_managed_identity() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(token_path()))
        .respond_with(token_error(401, "invalid_client", "bad secret"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/imds"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "mi-token",
            "expires_on": "4102444800"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = AuthConfig::from_vars([
        ("AZURE_TENANT_ID", TENANT.to_string()),
        ("AZURE_CLIENT_ID", CLIENT.to_string()),
        ("AZURE_CLIENT_SECRET", "wrong".to_string()),
        ("AZURE_AUTHORITY_HOST", server.uri()),
        ("AZURE_MANAGED_IDENTITY_ENDPOINT", format!("{}/imds", server.uri())),
    ])
    .unwrap();

    let credential = get_credential(&config).unwrap();
    let token = credential.get_token(GRAPH_SCOPE).await.unwrap();
    assert_eq!(token.secret(), "mi-token");
}
