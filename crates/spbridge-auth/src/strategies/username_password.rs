//! Resource owner password credentials grant
//!
//! Microsoft retired this flow for most tenants on 30 September 2025. It is
//! kept for app registrations that still allow it and warns on construction.

use async_trait::async_trait;
use oauth2::basic::BasicClient;
use oauth2::{
    AuthType, ClientId, ClientSecret, ResourceOwnerPassword, ResourceOwnerUsername, Scope,
};
use secrecy::{ExposeSecret, SecretString};
use tracing::warn;

use super::{access_token_from, http_client, map_token_error, token_url, TokenClient};
use crate::credential::{AccessToken, TokenCredential};
use crate::error::{AuthenticationError, ConfigurationError};

const KIND: &str = "username_password";

pub struct UsernamePasswordCredential {
    client: TokenClient,
    http: reqwest::Client,
    username: String,
    password: SecretString,
}

impl UsernamePasswordCredential {
    pub fn new(
        authority: &str,
        tenant_id: &str,
        client_id: &str,
        client_secret: &SecretString,
        username: &str,
        password: &SecretString,
    ) -> Result<Self, ConfigurationError> {
        warn!(
            username,
            "Username/password authentication is deprecated by Microsoft and may stop working"
        );

        let client = BasicClient::new(ClientId::new(client_id.to_string()))
            .set_client_secret(ClientSecret::new(client_secret.expose_secret().clone()))
            .set_auth_type(AuthType::RequestBody)
            .set_token_uri(token_url(authority, tenant_id)?);

        Ok(Self {
            client,
            http: http_client(),
            username: username.to_string(),
            password: password.clone(),
        })
    }
}

#[async_trait]
impl TokenCredential for UsernamePasswordCredential {
    async fn get_token(&self, scope: &str) -> Result<AccessToken, AuthenticationError> {
        let username = ResourceOwnerUsername::new(self.username.clone());
        let password = ResourceOwnerPassword::new(self.password.expose_secret().clone());

        let response = self
            .client
            .exchange_password(&username, &password)
            .add_scope(Scope::new(scope.to_string()))
            .request_async(&self.http)
            .await
            .map_err(|e| map_token_error(KIND, e))?;

        Ok(access_token_from(&response))
    }
}
