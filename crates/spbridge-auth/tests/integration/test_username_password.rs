//! Resource owner password grant against a mocked token endpoint

use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer};

use spbridge_auth::{get_credential, AuthConfig, Strategy, TokenCredential};

use crate::common::*;

#[tokio::test]
async fn test_password_grant_is_sent() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(token_path()))
        .and(body_string_contains("grant_type=password"))
        .and(body_string_contains("username=alice%40contoso.com"))
        .and(body_string_contains("client_secret=app-secret"))
        .respond_with(token_response("ropc-token"))
        .expect(1)
        .mount(&server)
        .await;

    let config = AuthConfig::builder()
        .strategy(Strategy::UsernamePassword)
        .tenant_id(TENANT)
        .client_id(CLIENT)
        .client_secret("app-secret")
        .username("alice@contoso.com")
        .password("correct horse")
        .authority_host(server.uri())
        .build()
        .unwrap();

    let credential = get_credential(&config).unwrap();
    let token = credential.get_token(GRAPH_SCOPE).await.unwrap();
    assert_eq!(token.secret(), "ropc-token");
}
