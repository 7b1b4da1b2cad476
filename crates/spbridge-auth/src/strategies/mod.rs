//! Concrete credential strategies
//!
//! One module per [`Strategy`](crate::Strategy). Each exposes a type that
//! implements [`TokenCredential`](crate::TokenCredential); the factory picks
//! and wires them.

pub mod certificate;
pub mod chain;
pub mod cli;
pub mod client_secret;
pub mod interactive;
pub mod managed_identity;
pub mod username_password;

pub use certificate::ClientCertificateCredential;
pub use chain::ChainedCredential;
pub use cli::AzureCliCredential;
pub use client_secret::ClientSecretCredential;
pub use interactive::InteractiveBrowserCredential;
pub use managed_identity::ManagedIdentityCredential;
pub use username_password::UsernamePasswordCredential;

use chrono::{Duration, Utc};
use oauth2::basic::{BasicClient, BasicErrorResponse, BasicTokenResponse};
use oauth2::{EndpointNotSet, EndpointSet, RequestTokenError, TokenResponse, TokenUrl};

use crate::credential::AccessToken;
use crate::error::{AuthenticationError, ConfigurationError};

/// oauth2 client with only the token endpoint configured
pub(crate) type TokenClient =
    BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// `{authority}/{tenant}/oauth2/v2.0/token`
pub(crate) fn token_endpoint(authority: &str, tenant_id: &str) -> String {
    format!("{}/{}/oauth2/v2.0/token", authority.trim_end_matches('/'), tenant_id)
}

/// `{authority}/{tenant}/oauth2/v2.0/authorize`
pub(crate) fn authorize_endpoint(authority: &str, tenant_id: &str) -> String {
    format!(
        "{}/{}/oauth2/v2.0/authorize",
        authority.trim_end_matches('/'),
        tenant_id
    )
}

pub(crate) fn token_url(authority: &str, tenant_id: &str) -> Result<TokenUrl, ConfigurationError> {
    TokenUrl::new(token_endpoint(authority, tenant_id)).map_err(|e| {
        ConfigurationError::InvalidValue {
            field: "authority_host",
            reason: e.to_string(),
        }
    })
}

/// HTTP client for identity endpoints
///
/// Redirects are not followed so credentials are never replayed to another host.
pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap_or_default()
}

/// Converts an oauth2 token response, defaulting the lifetime to one hour
pub(crate) fn access_token_from(response: &BasicTokenResponse) -> AccessToken {
    let expires_on = response
        .expires_in()
        .map(|d| Utc::now() + Duration::seconds(d.as_secs() as i64))
        .unwrap_or_else(|| Utc::now() + Duration::hours(1));

    AccessToken::new(response.access_token().secret().to_string(), expires_on)
}

/// Maps an oauth2 request failure, keeping the provider's error code
pub(crate) fn map_token_error<RE>(
    credential: &'static str,
    err: RequestTokenError<RE, BasicErrorResponse>,
) -> AuthenticationError
where
    RE: std::error::Error + 'static,
{
    match err {
        RequestTokenError::ServerResponse(response) => {
            let message = match response.error_description() {
                Some(description) => format!("{}: {}", response.error(), description),
                None => response.error().to_string(),
            };
            AuthenticationError::rejected(credential, message)
        }
        RequestTokenError::Request(e) => AuthenticationError::unavailable(credential, e.to_string()),
        RequestTokenError::Parse(e, _) => {
            AuthenticationError::rejected(credential, format!("unexpected token response: {e}"))
        }
        RequestTokenError::Other(message) => AuthenticationError::rejected(credential, message),
    }
}
