//! App registration with a client secret (client credentials grant)

use async_trait::async_trait;
use oauth2::basic::BasicClient;
use oauth2::{AuthType, ClientId, ClientSecret, Scope};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use super::{access_token_from, http_client, map_token_error, token_url, TokenClient};
use crate::credential::{AccessToken, TokenCredential};
use crate::error::{AuthenticationError, ConfigurationError};

const KIND: &str = "client_secret";

pub struct ClientSecretCredential {
    client: TokenClient,
    http: reqwest::Client,
}

impl ClientSecretCredential {
    pub fn new(
        authority: &str,
        tenant_id: &str,
        client_id: &str,
        client_secret: &SecretString,
    ) -> Result<Self, ConfigurationError> {
        let client = BasicClient::new(ClientId::new(client_id.to_string()))
            .set_client_secret(ClientSecret::new(client_secret.expose_secret().clone()))
            .set_auth_type(AuthType::RequestBody)
            .set_token_uri(token_url(authority, tenant_id)?);

        Ok(Self {
            client,
            http: http_client(),
        })
    }
}

#[async_trait]
impl TokenCredential for ClientSecretCredential {
    async fn get_token(&self, scope: &str) -> Result<AccessToken, AuthenticationError> {
        debug!(scope, "Requesting client credentials token");

        let response = self
            .client
            .exchange_client_credentials()
            .add_scope(Scope::new(scope.to_string()))
            .request_async(&self.http)
            .await
            .map_err(|e| map_token_error(KIND, e))?;

        Ok(access_token_from(&response))
    }
}
