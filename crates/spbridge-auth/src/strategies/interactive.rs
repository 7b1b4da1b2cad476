//! Authorization Code flow with PKCE in the user's browser
//!
//! ## Components
//!
//! - [`PkceFlow`] - builds the authorization URL and redeems codes
//! - [`LocalCallbackServer`] - one-shot HTTP listener on the redirect URI
//! - [`InteractiveBrowserCredential`] - ties both to a browser launch and
//!   keeps the refresh token in memory for later scopes

use std::net::SocketAddr;

use async_trait::async_trait;
use oauth2::basic::{BasicClient, BasicTokenResponse};
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, CsrfToken, EndpointNotSet, EndpointSet,
    PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, RefreshToken, Scope, TokenResponse,
};
use secrecy::{ExposeSecret, SecretString};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

use super::{access_token_from, authorize_endpoint, http_client, map_token_error, token_url};
use crate::credential::{AccessToken, TokenCredential};
use crate::error::{AuthenticationError, ConfigurationError};

const KIND: &str = "interactive_browser";

/// Requested alongside the resource scope so a refresh token is issued
const OFFLINE_ACCESS: &str = "offline_access";

type AuthCodeClient =
    BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

// ============================================================================
// PkceFlow
// ============================================================================

/// OAuth2 PKCE challenge and exchange logic
pub struct PkceFlow {
    client: AuthCodeClient,
    http: reqwest::Client,
}

impl PkceFlow {
    pub fn new(
        authority: &str,
        tenant_id: &str,
        client_id: &str,
        redirect_uri: &Url,
    ) -> Result<Self, ConfigurationError> {
        let invalid = |field: &'static str| {
            move |e: oauth2::url::ParseError| ConfigurationError::InvalidValue {
                field,
                reason: e.to_string(),
            }
        };

        let client = BasicClient::new(ClientId::new(client_id.to_string()))
            .set_auth_uri(
                AuthUrl::new(authorize_endpoint(authority, tenant_id))
                    .map_err(invalid("authority_host"))?,
            )
            .set_token_uri(token_url(authority, tenant_id)?)
            .set_redirect_uri(
                RedirectUrl::new(redirect_uri.to_string()).map_err(invalid("redirect_uri"))?,
            );

        Ok(Self {
            client,
            http: http_client(),
        })
    }

    /// Generates an authorization URL with a PKCE challenge
    ///
    /// Returns `(url, csrf_state, verifier)`. Keep the verifier until the
    /// code is exchanged and compare the callback's state with `csrf_state`.
    pub fn generate_auth_url(&self, scope: &str) -> (Url, CsrfToken, PkceCodeVerifier) {
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let (auth_url, csrf_token) = self
            .client
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new(scope.to_string()))
            .add_scope(Scope::new(OFFLINE_ACCESS.to_string()))
            .set_pkce_challenge(pkce_challenge)
            .url();

        debug!("Generated authorization URL");
        (auth_url, csrf_token, pkce_verifier)
    }

    pub async fn exchange_code(
        &self,
        code: String,
        pkce_verifier: PkceCodeVerifier,
    ) -> Result<BasicTokenResponse, AuthenticationError> {
        info!("Exchanging authorization code for tokens");
        self.client
            .exchange_code(AuthorizationCode::new(code))
            .set_pkce_verifier(pkce_verifier)
            .request_async(&self.http)
            .await
            .map_err(|e| map_token_error(KIND, e))
    }

    pub async fn refresh(
        &self,
        refresh_token: &SecretString,
        scope: &str,
    ) -> Result<BasicTokenResponse, AuthenticationError> {
        debug!(scope, "Redeeming refresh token");
        self.client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.expose_secret().clone()))
            .add_scope(Scope::new(scope.to_string()))
            .request_async(&self.http)
            .await
            .map_err(|e| map_token_error(KIND, e))
    }
}

// ============================================================================
// LocalCallbackServer
// ============================================================================

/// Parameters extracted from the OAuth2 callback
#[derive(Debug, PartialEq, Eq)]
pub struct CallbackParams {
    pub code: String,
    pub state: String,
}

/// One-shot HTTP listener for the OAuth2 redirect
///
/// Answers the first request that carries an authorization code (or an
/// error) and stops.
pub struct LocalCallbackServer {
    listener: TcpListener,
}

impl LocalCallbackServer {
    /// Binds to the host and port of `redirect_uri`
    pub async fn bind(redirect_uri: &Url) -> Result<Self, AuthenticationError> {
        let host = redirect_uri.host_str().unwrap_or("localhost");
        let host = if host == "localhost" { "127.0.0.1" } else { host };
        let port = redirect_uri.port_or_known_default().unwrap_or(80);
        Self::bind_addr(&format!("{host}:{port}")).await
    }

    pub async fn bind_addr(addr: &str) -> Result<Self, AuthenticationError> {
        info!("Starting local OAuth callback server on {}", addr);
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            AuthenticationError::unavailable(KIND, format!("cannot listen on {addr}: {e}"))
        })?;
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.local_addr().ok()
    }

    /// Waits for the redirect and checks its state against `expected_state`
    pub async fn receive(self, expected_state: &CsrfToken) -> Result<String, AuthenticationError> {
        use http_body_util::Full;
        use hyper::body::Bytes;
        use hyper::server::conn::http1;
        use hyper::service::service_fn;
        use hyper::{Request, Response, StatusCode};
        use hyper_util::rt::TokioIo;
        use tokio::sync::mpsc;

        let (tx, mut rx) = mpsc::channel::<Result<CallbackParams, String>>(1);

        let outcome = loop {
            let stream = tokio::select! {
                Some(outcome) = rx.recv() => break outcome,
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, _addr)) => stream,
                    Err(e) => {
                        return Err(AuthenticationError::unavailable(
                            KIND,
                            format!("callback server failed: {e}"),
                        ))
                    }
                },
            };

            let io = TokioIo::new(stream);
            let tx = tx.clone();
            let service = service_fn(move |req: Request<hyper::body::Incoming>| {
                let tx = tx.clone();
                async move {
                    let uri = req.uri().to_string();
                    let (status, html) = match parse_callback(&uri) {
                        Some(Ok(params)) => {
                            let _ = tx.send(Ok(params)).await;
                            (StatusCode::OK, success_html())
                        }
                        Some(Err(error)) => {
                            let page = error_html(&error);
                            let _ = tx.send(Err(error)).await;
                            (StatusCode::BAD_REQUEST, page)
                        }
                        // favicon and other stray requests
                        None => (StatusCode::NOT_FOUND, error_html("Not found")),
                    };
                    let mut response = Response::new(Full::new(Bytes::from(html)));
                    *response.status_mut() = status;
                    response.headers_mut().insert(
                        hyper::header::CONTENT_TYPE,
                        hyper::header::HeaderValue::from_static("text/html; charset=utf-8"),
                    );
                    Ok::<_, hyper::Error>(response)
                }
            });

            tokio::spawn(async move {
                if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                    warn!("Callback server connection error: {}", e);
                }
            });
        };

        let params = outcome.map_err(|e| AuthenticationError::rejected(KIND, e))?;
        if params.state != *expected_state.secret() {
            return Err(AuthenticationError::rejected(
                KIND,
                "callback state does not match the authorization request",
            ));
        }

        info!("Received OAuth callback with authorization code");
        Ok(params.code)
    }
}

/// Parses a callback request URI
///
/// `None` when the request carries neither a code nor an error.
fn parse_callback(uri: &str) -> Option<Result<CallbackParams, String>> {
    let url = Url::parse(&format!("http://localhost{uri}")).ok()?;
    let mut code = None;
    let mut state = None;
    let mut error = None;
    let mut description = None;

    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.to_string()),
            "state" => state = Some(value.to_string()),
            "error" => error = Some(value.to_string()),
            "error_description" => description = Some(value.to_string()),
            _ => {}
        }
    }

    if let Some(error) = error {
        return Some(Err(match description {
            Some(description) => format!("{error}: {description}"),
            None => error,
        }));
    }

    Some(Ok(CallbackParams {
        code: code?,
        state: state.unwrap_or_default(),
    }))
}

fn success_html() -> String {
    r#"<!DOCTYPE html>
<html>
<head><title>spbridge sign-in</title></head>
<body style="font-family: sans-serif; margin: 4em auto; max-width: 32em;">
    <h2>Signed in</h2>
    <p>spbridge received your sign-in. This tab can be closed.</p>
</body>
</html>"#
        .to_string()
}

fn error_html(message: &str) -> String {
    let escaped = message
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;");
    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>spbridge sign-in</title></head>
<body style="font-family: sans-serif; margin: 4em auto; max-width: 32em;">
    <h2>Sign-in failed</h2>
    <p>{escaped}</p>
    <p>Close this tab and start the sign-in again.</p>
</body>
</html>"#
    )
}

// ============================================================================
// InteractiveBrowserCredential
// ============================================================================

/// Interactive sign-in through the system browser
///
/// The first `get_token` opens the browser and waits for the redirect. Later
/// scopes are served from the refresh token without another prompt.
pub struct InteractiveBrowserCredential {
    flow: PkceFlow,
    redirect_uri: Url,
    refresh_token: Mutex<Option<SecretString>>,
}

impl InteractiveBrowserCredential {
    pub fn new(
        authority: &str,
        tenant_id: &str,
        client_id: &str,
        redirect_uri: Url,
    ) -> Result<Self, ConfigurationError> {
        Ok(Self {
            flow: PkceFlow::new(authority, tenant_id, client_id, &redirect_uri)?,
            redirect_uri,
            refresh_token: Mutex::new(None),
        })
    }

    async fn login(&self, scope: &str) -> Result<BasicTokenResponse, AuthenticationError> {
        info!("Starting interactive browser login");

        let server = LocalCallbackServer::bind(&self.redirect_uri).await?;
        let (auth_url, csrf_state, pkce_verifier) = self.flow.generate_auth_url(scope);

        info!("Opening browser for authentication");
        webbrowser::open(auth_url.as_str()).map_err(|e| {
            AuthenticationError::unavailable(KIND, format!("cannot open browser: {e}"))
        })?;

        let code = server.receive(&csrf_state).await?;
        self.flow.exchange_code(code, pkce_verifier).await
    }
}

#[async_trait]
impl TokenCredential for InteractiveBrowserCredential {
    async fn get_token(&self, scope: &str) -> Result<AccessToken, AuthenticationError> {
        let mut refresh_token = self.refresh_token.lock().await;

        let response = match refresh_token.as_ref() {
            Some(existing) => match self.flow.refresh(existing, scope).await {
                Ok(response) => response,
                Err(e) => {
                    warn!("Refresh token was not accepted, signing in again: {}", e);
                    self.login(scope).await?
                }
            },
            None => self.login(scope).await?,
        };

        if let Some(new_refresh) = response.refresh_token() {
            *refresh_token = Some(SecretString::new(new_refresh.secret().to_string()));
        }

        Ok(access_token_from(&response))
    }
}
