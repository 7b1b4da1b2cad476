//! Microsoft Graph API client
//!
//! Thin wrapper over `reqwest::Client` that prefixes the API root, attaches
//! a bearer token from the shared [`Credential`] and turns failed responses
//! into [`spbridge_core::Error`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use spbridge_graph::client::GraphClient;
//! use reqwest::Method;
//!
//! # async fn example(credential: spbridge_auth::Credential) -> spbridge_core::Result<()> {
//! let client = GraphClient::new(credential);
//! let request = client.request(Method::GET, "/sites/contoso.sharepoint.com").await?;
//! let site: serde_json::Value = client.send(request, "site").await?.json().await?;
//! # Ok(())
//! # }
//! ```

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use spbridge_auth::{Credential, TokenCredential, GRAPH_DEFAULT_SCOPE};
use spbridge_core::config::{DEFAULT_GRAPH_BASE_URL, DEFAULT_PAGE_SIZE};
use spbridge_core::remote::check_response;
use spbridge_core::{BackendKind, Result};
use tracing::debug;

/// HTTP client for Microsoft Graph API calls
///
/// Tokens are requested per call; the credential's own cache keeps that
/// cheap.
#[derive(Clone)]
pub struct GraphClient {
    /// The underlying HTTP client
    client: Client,
    /// Base URL for API requests, without a trailing slash
    base_url: String,
    credential: Credential,
    /// `$top` for listing requests
    page_size: u32,
}

impl GraphClient {
    /// Creates a client for the public Graph v1.0 endpoint
    pub fn new(credential: Credential) -> Self {
        Self::with_base_url(credential, DEFAULT_GRAPH_BASE_URL)
    }

    /// Creates a client with a custom base URL (useful for testing)
    pub fn with_base_url(credential: Credential, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            credential,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Replaces the transport, e.g. to set timeouts or a proxy
    #[must_use]
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Creates an authenticated request builder for `path` below the base URL
    ///
    /// # Errors
    /// [`spbridge_core::Error::Authentication`] when no token can be obtained.
    pub async fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = format!("{}{}", self.base_url, path);
        self.request_url(method, &url).await
    }

    /// Same as [`request`](Self::request) for an absolute URL such as an
    /// `@odata.nextLink`
    ///
    /// # Errors
    /// See [`request`](Self::request).
    pub async fn request_url(&self, method: Method, url: &str) -> Result<RequestBuilder> {
        let token = self.credential.get_token(GRAPH_DEFAULT_SCOPE).await?;
        debug!(%method, url, "Graph request");
        Ok(self
            .client
            .request(method, url)
            .bearer_auth(token.secret()))
    }

    /// Sends `request` and fails on any non-success status
    ///
    /// `resource` names what the request addresses and appears in errors.
    ///
    /// # Errors
    /// [`spbridge_core::Error::Network`] on transport failure, otherwise the
    /// status mapping in [`spbridge_core::remote`].
    pub async fn send(&self, request: RequestBuilder, resource: &str) -> Result<Response> {
        let response = request.send().await?;
        check_response(response, BackendKind::Graph, resource).await
    }

    /// `GET path` decoded as JSON
    ///
    /// # Errors
    /// See [`send`](Self::send).
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str, resource: &str) -> Result<T> {
        let request = self.request(Method::GET, path).await?;
        Ok(self.send(request, resource).await?.json().await?)
    }
}

impl std::fmt::Debug for GraphClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphClient")
            .field("base_url", &self.base_url)
            .field("credential", &self.credential)
            .field("page_size", &self.page_size)
            .finish()
    }
}
