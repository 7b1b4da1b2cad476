//! Backend identity and selection policy

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use spbridge_auth::ConfigurationError;

/// A concrete remote API implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Microsoft Graph drive items
    Graph,
    /// SharePoint REST (`_api/web`)
    Legacy,
}

impl BackendKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Graph => "graph",
            BackendKind::Legacy => "legacy",
        }
    }
}

impl Display for BackendKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which backend the dispatcher uses, fixed at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendPolicy {
    /// Graph only
    Graph,
    /// Legacy REST only
    Legacy,
    /// Graph first, Legacy when Graph cannot perform the operation
    #[default]
    Auto,
}

impl BackendPolicy {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            BackendPolicy::Graph => "graph",
            BackendPolicy::Legacy => "legacy",
            BackendPolicy::Auto => "auto",
        }
    }
}

impl Display for BackendPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendPolicy {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "graph" => Ok(BackendPolicy::Graph),
            "legacy" => Ok(BackendPolicy::Legacy),
            "auto" => Ok(BackendPolicy::Auto),
            _ => Err(ConfigurationError::InvalidValue {
                field: "backend",
                reason: format!("expected graph, legacy or auto, got {s:?}"),
            }),
        }
    }
}
