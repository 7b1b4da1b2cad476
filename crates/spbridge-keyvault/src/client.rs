//! Key Vault data-plane client
//!
//! Every request goes to `{vault}/{collection}/...?api-version=7.4` with a
//! bearer token for [`KEY_VAULT_SCOPE`]. Failures carry the same
//! `{"error": {"code", "message"}}` body as Graph and map onto
//! [`spbridge_core::Error`].
//!
//! Deletes and recoveries finish asynchronously on the service side; the
//! client polls until the result is visible, like the Azure SDK pollers.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use spbridge_auth::{
    get_credential, AuthConfig, AuthenticationError, ConfigurationError, Credential, Strategy,
    TokenCredential, KEY_VAULT_SCOPE,
};
use spbridge_core::remote::RemoteFault;
use spbridge_core::{Error, Result, ValidationError};
use tracing::{debug, warn};

/// Data-plane API version sent with every request
pub const API_VERSION: &str = "7.4";

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
const DEFAULT_POLL_ATTEMPTS: u32 = 30;

/// Longest secret or certificate name Key Vault accepts
const MAX_NAME_LEN: usize = 127;

/// Credential for a run mode
///
/// | `local_run` | client id | Credential |
/// |-------------|-----------|------------|
/// | `true` | any | Azure CLI |
/// | `false` | `Some` | managed identity with that client id |
/// | `false` | `None` | default chain |
///
/// # Errors
/// [`ConfigurationError`] from building the credential.
pub fn credential_for_run(
    local_run: bool,
    managed_identity_client_id: Option<&str>,
) -> std::result::Result<Credential, ConfigurationError> {
    let builder = match (local_run, managed_identity_client_id) {
        (true, _) => AuthConfig::builder().strategy(Strategy::Cli),
        (false, Some(client_id)) => AuthConfig::builder()
            .strategy(Strategy::ManagedIdentity)
            .client_id(client_id),
        (false, None) => AuthConfig::builder().strategy(Strategy::Default),
    };
    get_credential(&builder.build()?)
}

/// Rejects anything but 1-127 ASCII letters, digits and dashes
///
/// # Errors
/// [`ValidationError::InvalidName`].
pub fn validate_object_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name.len() <= MAX_NAME_LEN
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(Error::Validation(ValidationError::InvalidName {
            name: name.to_string(),
            reason: "Key Vault names are 1-127 letters, digits or dashes",
        }))
    }
}

/// One page of a Key Vault collection
#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    value: Vec<Map<String, Value>>,
    #[serde(rename = "nextLink")]
    next_link: Option<String>,
}

/// HTTP client bound to one vault
#[derive(Clone)]
pub struct KeyVaultClient {
    client: Client,
    vault_url: String,
    credential: Credential,
    poll_interval: Duration,
    poll_attempts: u32,
}

impl KeyVaultClient {
    /// # Errors
    /// [`Error::Configuration`] when `vault_url` is not an absolute URL with
    /// a host.
    pub fn new(vault_url: &str, credential: Credential) -> Result<Self> {
        let invalid = |reason: String| {
            Error::Configuration(ConfigurationError::InvalidValue {
                field: "vault_url",
                reason,
            })
        };
        let url = url::Url::parse(vault_url.trim()).map_err(|e| invalid(e.to_string()))?;
        if url.host_str().map_or(true, str::is_empty) {
            return Err(invalid("URL has no host".to_string()));
        }

        Ok(Self {
            client: Client::new(),
            vault_url: url.as_str().trim_end_matches('/').to_string(),
            credential,
            poll_interval: DEFAULT_POLL_INTERVAL,
            poll_attempts: DEFAULT_POLL_ATTEMPTS,
        })
    }

    /// Client authenticated per [`credential_for_run`]
    ///
    /// # Errors
    /// See [`new`](Self::new) and [`credential_for_run`].
    pub fn for_run(
        vault_url: &str,
        local_run: bool,
        managed_identity_client_id: Option<&str>,
    ) -> Result<Self> {
        let credential = credential_for_run(local_run, managed_identity_client_id)?;
        Self::new(vault_url, credential)
    }

    /// Replaces the transport, e.g. to set timeouts or a proxy
    #[must_use]
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// How often and how many times delete and recover results are polled
    #[must_use]
    pub fn with_polling(mut self, interval: Duration, attempts: u32) -> Self {
        self.poll_interval = interval;
        self.poll_attempts = attempts.max(1);
        self
    }

    pub fn vault_url(&self) -> &str {
        &self.vault_url
    }

    /// Authenticated request for `path` below the vault URL, e.g. `/secrets/db-password`
    ///
    /// # Errors
    /// [`Error::Authentication`] when no token can be obtained.
    pub async fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = format!("{}{path}?api-version={API_VERSION}", self.vault_url);
        self.request_url(method, &url).await
    }

    /// Same as [`request`](Self::request) for an absolute URL such as a
    /// `nextLink`, which already carries the API version
    ///
    /// # Errors
    /// See [`request`](Self::request).
    pub async fn request_url(&self, method: Method, url: &str) -> Result<RequestBuilder> {
        let token = self.credential.get_token(KEY_VAULT_SCOPE).await?;
        debug!(%method, url, "Key Vault request");
        Ok(self.client.request(method, url).bearer_auth(token.secret()))
    }

    /// Sends `request`, mapping failures to [`Error`]
    ///
    /// # Errors
    /// [`Error::Network`] on transport failure, otherwise the status mapping
    /// of [`error_for_status`].
    pub async fn send(&self, request: RequestBuilder, resource: &str) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        debug!(status = status.as_u16(), resource, "Key Vault request failed");
        Err(error_for_status(status, &body, resource))
    }

    /// `GET path` decoded as JSON
    ///
    /// # Errors
    /// See [`send`](Self::send).
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str, resource: &str) -> Result<T> {
        let request = self.request(Method::GET, path).await?;
        Ok(self.send(request, resource).await?.json().await?)
    }

    /// Fetches a collection and every following page
    ///
    /// `max_page_size` becomes `maxresults` on the first request; it limits
    /// the page, not the total.
    ///
    /// # Errors
    /// The first failing page aborts the listing.
    pub async fn get_all(
        &self,
        path: &str,
        max_page_size: Option<u32>,
        resource: &str,
    ) -> Result<Vec<Map<String, Value>>> {
        let mut request = self.request(Method::GET, path).await?;
        if let Some(max) = max_page_size {
            request = request.query(&[("maxresults", max)]);
        }
        let mut page: Page = self.send(request, resource).await?.json().await?;
        let mut items = std::mem::take(&mut page.value);

        while let Some(next_link) = page.next_link.take().filter(|link| !link.is_empty()) {
            debug!(resource, "Following nextLink");
            let request = self.request_url(Method::GET, &next_link).await?;
            page = self.send(request, resource).await?.json().await?;
            items.append(&mut page.value);
        }
        Ok(items)
    }

    /// Polls `GET path` until it stops answering 404
    ///
    /// Gives up with a warning after the configured attempts; the operation
    /// itself has already been accepted by then.
    pub(crate) async fn wait_for(&self, path: &str, resource: &str) -> Result<()> {
        for attempt in 1..=self.poll_attempts {
            let request = self.request(Method::GET, path).await?;
            match self.send(request, resource).await {
                Ok(_) => return Ok(()),
                Err(Error::NotFound(_)) => {
                    debug!(resource, attempt, "Operation still pending");
                    tokio::time::sleep(self.poll_interval).await;
                }
                // No read permission on the target; nothing left to observe
                Err(Error::PermissionDenied(_)) => return Ok(()),
                Err(e) => return Err(e),
            }
        }

        warn!(resource, attempts = self.poll_attempts, "Gave up waiting for Key Vault operation");
        Ok(())
    }
}

impl std::fmt::Debug for KeyVaultClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyVaultClient")
            .field("vault_url", &self.vault_url)
            .field("credential", &self.credential)
            .finish_non_exhaustive()
    }
}

/// Maps a failed status plus its body to an [`Error`]
#[must_use]
pub fn error_for_status(status: StatusCode, body: &str, resource: &str) -> Error {
    let fault = RemoteFault::parse(body);
    let describe = || {
        if fault.message.is_empty() {
            resource.to_string()
        } else {
            format!("{resource}: {}", fault.message)
        }
    };

    match status {
        StatusCode::UNAUTHORIZED => Error::Authentication(AuthenticationError::Rejected {
            credential: "bearer token",
            message: describe(),
        }),
        StatusCode::FORBIDDEN => Error::PermissionDenied(describe()),
        StatusCode::NOT_FOUND => Error::NotFound(resource.to_string()),
        StatusCode::CONFLICT => Error::Conflict(describe()),
        _ => Error::Remote {
            status: status.as_u16(),
            code: fault.code,
            message: fault.message,
        },
    }
}

/// Name and version from an object id such as
/// `https://contoso.vault.azure.net/secrets/db-password/4387e9f3`
pub fn parse_object_id(id: &str) -> Option<(String, Option<String>)> {
    let url = url::Url::parse(id).ok()?;
    let mut segments = url.path_segments()?.filter(|s| !s.is_empty()).skip(1);
    let name = segments.next()?.to_string();
    let version = segments.next().map(str::to_string);
    Some((name, version))
}
