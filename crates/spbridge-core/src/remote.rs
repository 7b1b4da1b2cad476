//! HTTP failures to [`Error`]
//!
//! Both adapters funnel every non-success response through
//! [`check_response`], so a 404 means the same thing whichever API sent it.
//!
//! Error bodies come in two shapes:
//!
//! ```text
//! Graph:  {"error": {"code": "itemNotFound", "message": "..."}}
//! Legacy: {"odata.error": {"code": "-2147024894, System.IO.FileNotFoundException",
//!                          "message": {"lang": "en-US", "value": "..."}}}
//! ```

use reqwest::{Response, StatusCode};
use serde_json::Value;
use spbridge_auth::AuthenticationError;
use tracing::debug;

use crate::domain::{BackendKind, Error, Result};

/// Legacy error codes that mean "does not exist" even on a non-404 status
const LEGACY_NOT_FOUND_CODES: [&str; 2] = ["FileNotFoundException", "-2147024894"];

/// Graph error code for operations the endpoint does not implement
const GRAPH_NOT_SUPPORTED: &str = "notSupported";

/// Code and message extracted from an error body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteFault {
    pub code: String,
    pub message: String,
}

impl RemoteFault {
    /// Parses either body shape; anything else becomes the raw text
    #[must_use]
    pub fn parse(body: &str) -> Self {
        let Ok(json) = serde_json::from_str::<Value>(body) else {
            return Self {
                code: String::new(),
                message: body.trim().to_string(),
            };
        };

        if let Some(error) = json.get("error") {
            return Self {
                code: string_at(error, "code"),
                message: string_at(error, "message"),
            };
        }

        if let Some(error) = json.get("odata.error") {
            let message = match error.get("message") {
                Some(Value::Object(m)) => m
                    .get("value")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                Some(Value::String(s)) => s.clone(),
                _ => String::new(),
            };
            return Self {
                code: string_at(error, "code"),
                message,
            };
        }

        Self {
            code: String::new(),
            message: body.trim().to_string(),
        }
    }

    fn describe(&self, resource: &str) -> String {
        if self.message.is_empty() {
            resource.to_string()
        } else {
            format!("{resource}: {}", self.message)
        }
    }
}

fn string_at(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Maps a failed status plus its body to an [`Error`]
///
/// `resource` names what was being addressed (usually the remote path) and
/// ends up in the error message.
#[must_use]
pub fn error_for_status(
    status: StatusCode,
    body: &str,
    backend: BackendKind,
    resource: &str,
) -> Error {
    let fault = RemoteFault::parse(body);

    match status {
        StatusCode::UNAUTHORIZED => Error::Authentication(AuthenticationError::Rejected {
            credential: "bearer token",
            message: fault.describe(resource),
        }),
        StatusCode::FORBIDDEN => Error::PermissionDenied(fault.describe(resource)),
        StatusCode::NOT_FOUND => Error::NotFound(resource.to_string()),
        StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED => {
            Error::Conflict(fault.describe(resource))
        }
        StatusCode::NOT_IMPLEMENTED => Error::incapable(backend, fault.describe(resource)),
        _ if backend == BackendKind::Legacy
            && LEGACY_NOT_FOUND_CODES
                .iter()
                .any(|code| fault.code.contains(code)) =>
        {
            Error::NotFound(resource.to_string())
        }
        _ if backend == BackendKind::Graph && fault.code == GRAPH_NOT_SUPPORTED => {
            Error::incapable(backend, fault.describe(resource))
        }
        _ => Error::Remote {
            status: status.as_u16(),
            code: fault.code,
            message: fault.message,
        },
    }
}

/// Passes a successful response through, turns anything else into an
/// [`Error`]
///
/// # Errors
/// See [`error_for_status`]; a body that cannot be read is reported with an
/// empty message.
pub async fn check_response(
    response: Response,
    backend: BackendKind,
    resource: &str,
) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    debug!(
        backend = %backend,
        status = status.as_u16(),
        resource,
        "Remote request failed"
    );
    Err(error_for_status(status, &body, backend, resource))
}
