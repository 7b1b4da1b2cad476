//! Token from the locally logged-in Azure CLI (`az`)

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use serde_json::Value;
use tokio::process::Command;
use tracing::debug;

use crate::credential::{AccessToken, TokenCredential};
use crate::error::AuthenticationError;

const KIND: &str = "cli";

const AZ_PROGRAM: &str = "az";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CliToken {
    access_token: String,
    /// Epoch seconds, present in az 2.54 and later
    #[serde(default, rename = "expires_on")]
    expires_on_epoch: Option<Value>,
    /// Naive local timestamp, e.g. `2024-01-01 12:00:00.000000`
    #[serde(default)]
    expires_on: Option<String>,
}

pub struct AzureCliCredential {
    program: String,
    tenant_id: Option<String>,
}

impl AzureCliCredential {
    pub fn new(tenant_id: Option<String>) -> Self {
        Self {
            program: AZ_PROGRAM.to_string(),
            tenant_id,
        }
    }

    /// Uses another executable in place of `az`
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    fn args(&self, scope: &str) -> Vec<String> {
        let mut args = vec![
            "account".to_string(),
            "get-access-token".to_string(),
            "--output".to_string(),
            "json".to_string(),
            "--scope".to_string(),
            scope.to_string(),
        ];
        if let Some(tenant) = &self.tenant_id {
            args.push("--tenant".to_string());
            args.push(tenant.clone());
        }
        args
    }
}

#[async_trait]
impl TokenCredential for AzureCliCredential {
    async fn get_token(&self, scope: &str) -> Result<AccessToken, AuthenticationError> {
        debug!(program = %self.program, scope, "Requesting token from Azure CLI");

        let output = Command::new(&self.program)
            .args(self.args(scope))
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| AuthenticationError::unavailable(KIND, format!("{}: {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = stderr.trim();
            return Err(if message.contains("az login") {
                AuthenticationError::unavailable(KIND, message.to_string())
            } else {
                AuthenticationError::rejected(KIND, message.to_string())
            });
        }

        parse_cli_output(&output.stdout)
    }
}

/// Parses `az account get-access-token --output json`
pub(crate) fn parse_cli_output(stdout: &[u8]) -> Result<AccessToken, AuthenticationError> {
    let token: CliToken = serde_json::from_slice(stdout)
        .map_err(|e| AuthenticationError::rejected(KIND, format!("unexpected CLI output: {e}")))?;

    let epoch = token.expires_on_epoch.as_ref().and_then(|v| match v {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    });
    let expires_on = match (epoch, token.expires_on.as_deref()) {
        (Some(epoch), _) => DateTime::<Utc>::from_timestamp(epoch, 0),
        (None, Some(local)) => parse_local_timestamp(local),
        (None, None) => None,
    }
    .ok_or_else(|| AuthenticationError::rejected(KIND, "CLI output has no usable expiry"))?;

    Ok(AccessToken::new(token.access_token, expires_on))
}

fn parse_local_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f").ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}
