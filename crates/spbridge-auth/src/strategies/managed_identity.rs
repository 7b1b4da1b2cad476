//! Azure managed identity via the instance metadata endpoint

use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::credential::{AccessToken, TokenCredential};
use crate::error::AuthenticationError;
use crate::scopes::resource_from_scope;

const KIND: &str = "managed_identity";

const API_VERSION: &str = "2018-02-01";

/// Short, so the default chain moves on quickly off Azure
const CONNECT_TIMEOUT: StdDuration = StdDuration::from_secs(2);
const REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(10);

#[derive(Deserialize)]
struct ImdsToken {
    access_token: String,
    #[serde(default)]
    expires_on: Option<Value>,
    #[serde(default)]
    expires_in: Option<Value>,
}

/// System-assigned, or user-assigned when `client_id` is given
pub struct ManagedIdentityCredential {
    endpoint: Url,
    client_id: Option<String>,
    http: reqwest::Client,
}

impl ManagedIdentityCredential {
    pub fn new(endpoint: Url, client_id: Option<String>) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            endpoint,
            client_id,
            http,
        }
    }
}

#[async_trait]
impl TokenCredential for ManagedIdentityCredential {
    async fn get_token(&self, scope: &str) -> Result<AccessToken, AuthenticationError> {
        let mut query = vec![
            ("api-version", API_VERSION),
            ("resource", resource_from_scope(scope)),
        ];
        if let Some(client_id) = &self.client_id {
            query.push(("client_id", client_id.as_str()));
        }

        debug!(endpoint = %self.endpoint, "Requesting managed identity token");
        let response = self
            .http
            .get(self.endpoint.clone())
            .header("Metadata", "true")
            .query(&query)
            .send()
            .await
            .map_err(|e| AuthenticationError::unavailable(KIND, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthenticationError::rejected(
                KIND,
                format!("HTTP {}: {}", status.as_u16(), body.trim()),
            ));
        }

        let token: ImdsToken = response
            .json()
            .await
            .map_err(|e| AuthenticationError::rejected(KIND, format!("unexpected response: {e}")))?;

        let expires_on = expiry(&token).unwrap_or_else(|| Utc::now() + Duration::hours(1));
        Ok(AccessToken::new(token.access_token, expires_on))
    }
}

/// `expires_on` is epoch seconds, as a string or a number depending on host
fn expiry(token: &ImdsToken) -> Option<DateTime<Utc>> {
    fn seconds(value: &Value) -> Option<i64> {
        match value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    if let Some(epoch) = token.expires_on.as_ref().and_then(seconds) {
        return DateTime::from_timestamp(epoch, 0);
    }
    token
        .expires_in
        .as_ref()
        .and_then(seconds)
        .map(|secs| Utc::now() + Duration::seconds(secs))
}
