//! Token credential abstraction
//!
//! Every strategy implements [`TokenCredential`]. Callers hold a
//! [`Credential`], a cheap cloneable handle that adds per-scope token
//! caching in front of the strategy.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::AuthenticationError;

/// Tokens are refreshed this long before they expire
pub const REFRESH_MARGIN_SECS: i64 = 300;

/// A bearer token and its expiry
#[derive(Clone)]
pub struct AccessToken {
    token: SecretString,
    expires_on: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(token: impl Into<String>, expires_on: DateTime<Utc>) -> Self {
        Self {
            token: SecretString::new(token.into()),
            expires_on,
        }
    }

    /// The raw bearer value, for the `Authorization` header only
    pub fn secret(&self) -> &str {
        self.token.expose_secret()
    }

    pub fn expires_on(&self) -> DateTime<Utc> {
        self.expires_on
    }

    /// True when the token is still valid for at least `margin`
    pub fn is_fresh(&self, margin: Duration) -> bool {
        self.expires_on - margin > Utc::now()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"[REDACTED]")
            .field("expires_on", &self.expires_on)
            .finish()
    }
}

/// Anything that can produce a bearer token for a scope
#[async_trait]
pub trait TokenCredential: Send + Sync {
    /// Returns a token valid for `scope`
    ///
    /// # Errors
    /// [`AuthenticationError`] when the token cannot be obtained.
    async fn get_token(&self, scope: &str) -> Result<AccessToken, AuthenticationError>;
}

/// Cloneable, caching credential handle
///
/// All clones share one cache. At most one refresh runs at a time; callers
/// that arrive during a refresh wait for it and reuse its result.
#[derive(Clone)]
pub struct Credential {
    kind: &'static str,
    inner: Arc<dyn TokenCredential>,
    cache: Arc<Mutex<HashMap<String, AccessToken>>>,
}

impl Credential {
    /// Wraps any [`TokenCredential`] with caching
    ///
    /// `kind` labels the credential in logs and `Debug` output.
    pub fn new(kind: &'static str, inner: Arc<dyn TokenCredential>) -> Self {
        Self {
            kind,
            inner,
            cache: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Label of the underlying credential
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Drops every cached token
    pub async fn clear_cache(&self) {
        self.cache.lock().await.clear();
    }
}

#[async_trait]
impl TokenCredential for Credential {
    async fn get_token(&self, scope: &str) -> Result<AccessToken, AuthenticationError> {
        let mut cache = self.cache.lock().await;

        if let Some(token) = cache.get(scope) {
            if token.is_fresh(Duration::seconds(REFRESH_MARGIN_SECS)) {
                return Ok(token.clone());
            }
        }

        debug!(credential = self.kind, scope, "Requesting new access token");
        let token = self.inner.get_token(scope).await?;
        cache.insert(scope.to_string(), token.clone());
        Ok(token)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}
