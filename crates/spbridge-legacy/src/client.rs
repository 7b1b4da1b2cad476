//! SharePoint REST client
//!
//! Every request goes to `{site}/_api/...` with a bearer token for the
//! site's own resource (`https://{tenant}.sharepoint.com/.default`), not the
//! Graph scope. Responses are requested as `odata=nometadata` JSON, so
//! objects arrive as plain property maps.

use reqwest::header::ACCEPT;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use spbridge_auth::{spo_scope_from_url, Credential, TokenCredential};
use spbridge_core::remote::check_response;
use spbridge_core::{BackendKind, Error, Result, SiteUrl, ValidationError};
use tracing::debug;

const ODATA_NOMETADATA: &str = "application/json;odata=nometadata";

/// HTTP client bound to one SharePoint site
#[derive(Clone)]
pub struct LegacyClient {
    client: Client,
    site: SiteUrl,
    credential: Credential,
    /// Token audience derived from the site URL
    scope: String,
}

impl LegacyClient {
    /// # Errors
    /// [`ValidationError::InvalidSiteUrl`] when no scope can be derived from
    /// the site URL.
    pub fn new(credential: Credential, site: SiteUrl) -> Result<Self> {
        let scope = spo_scope_from_url(site.as_str())
            .map_err(|_| Error::Validation(ValidationError::InvalidSiteUrl(site.to_string())))?;
        Ok(Self {
            client: Client::new(),
            site,
            credential,
            scope,
        })
    }

    /// Replaces the transport, e.g. to set timeouts or a proxy
    #[must_use]
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn site(&self) -> &SiteUrl {
        &self.site
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Authenticated request for `path` below the site URL, e.g.
    /// `/_api/web/GetFolderByServerRelativePath(...)`
    ///
    /// # Errors
    /// [`Error::Authentication`] when no token can be obtained.
    pub async fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = format!("{}{}", self.site.as_str(), path);
        self.request_url(method, &url).await
    }

    /// Same as [`request`](Self::request) for an absolute URL such as an
    /// `odata.nextLink`
    ///
    /// # Errors
    /// See [`request`](Self::request).
    pub async fn request_url(&self, method: Method, url: &str) -> Result<RequestBuilder> {
        let token = self.credential.get_token(&self.scope).await?;
        debug!(%method, url, "SharePoint REST request");
        Ok(self
            .client
            .request(method, url)
            .bearer_auth(token.secret())
            .header(ACCEPT, ODATA_NOMETADATA))
    }

    /// Sends `request`, mapping failures through [`check_response`]
    ///
    /// # Errors
    /// [`Error::Network`] on transport failure, otherwise the status mapping
    /// in [`spbridge_core::remote`].
    pub async fn send(&self, request: RequestBuilder, resource: &str) -> Result<Response> {
        let response = request.send().await?;
        check_response(response, BackendKind::Legacy, resource).await
    }

    /// `GET path` decoded as JSON
    ///
    /// # Errors
    /// See [`send`](Self::send).
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str, resource: &str) -> Result<T> {
        let request = self.request(Method::GET, path).await?;
        Ok(self.send(request, resource).await?.json().await?)
    }

    /// `POST path` without a body, ignoring whatever the service answers
    ///
    /// # Errors
    /// See [`send`](Self::send).
    pub async fn post_empty(&self, path: &str, resource: &str) -> Result<()> {
        let request = self
            .request(Method::POST, path)
            .await?
            .header(reqwest::header::CONTENT_LENGTH, 0);
        self.send(request, resource).await?;
        Ok(())
    }
}

impl std::fmt::Debug for LegacyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LegacyClient")
            .field("site", &self.site.as_str())
            .field("scope", &self.scope)
            .field("credential", &self.credential)
            .finish()
    }
}
