//! Client configuration
//!
//! Typed configuration that maps to a YAML file, with defaults, validation
//! and builder-style overrides for programmatic use.
//!
//! ```yaml
//! site_url: https://contoso.sharepoint.com/sites/finance
//! backend: auto
//! graph:
//!   page_size: 500
//!   list_options:
//!     orderby: name
//! logging:
//!   level: debug
//! auth:
//!   strategy: client_secret
//!   tenant_id: ...
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use spbridge_auth::{AuthConfig, ConfigurationError};

use crate::domain::{BackendPolicy, SiteUrl};

/// Default Microsoft Graph endpoint
pub const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";

/// Default `$top` for Graph listings
pub const DEFAULT_PAGE_SIZE: u32 = 500;

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Top-level configuration for a SharePoint client
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Site every path is resolved against
    pub site_url: String,
    #[serde(default)]
    pub backend: BackendPolicy,
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Credential settings; `None` means read them from the environment
    #[serde(default)]
    pub auth: Option<AuthConfig>,
}

/// Graph backend settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Items requested per listing page
    pub page_size: u32,
    /// API root, overridable for national clouds and tests
    pub base_url: String,
    pub list_options: ListOptions,
}

/// OData query options added to every Graph listing request
///
/// Filtering happens server-side, so a `$filter` narrows what every listing
/// returns. `$select` is widened with the fields records are built from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListOptions {
    pub select: Option<String>,
    pub expand: Option<String>,
    pub filter: Option<String>,
    pub orderby: Option<String>,
}

impl ListOptions {
    /// Set options as `($name, value)` pairs, blanks skipped
    pub fn query_pairs(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        [
            ("$select", &self.select),
            ("$expand", &self.expand),
            ("$filter", &self.filter),
            ("$orderby", &self.orderby),
        ]
        .into_iter()
        .filter_map(|(name, value)| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| (name, v))
        })
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            base_url: DEFAULT_GRAPH_BASE_URL.to_string(),
            list_options: ListOptions::default(),
        }
    }
}

/// Logging / tracing settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl ClientConfig {
    /// Configuration for `site_url` with every other setting at its default
    pub fn new(site_url: impl Into<String>) -> Self {
        Self {
            site_url: site_url.into(),
            backend: BackendPolicy::default(),
            graph: GraphConfig::default(),
            logging: LoggingConfig::default(),
            auth: None,
        }
    }

    /// Loads and validates a YAML file at `path`.
    ///
    /// # Errors
    /// [`ConfigurationError::Load`] when the file cannot be read or parsed,
    /// otherwise whatever [`ClientConfig::validate`] reports.
    pub fn load(path: &Path) -> Result<Self, ConfigurationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigurationError::Load(format!("{}: {e}", path.display()))
        })?;
        let config: ClientConfig = serde_yaml::from_str(&content)
            .map_err(|e| ConfigurationError::Load(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the settings that the type system does not
    ///
    /// # Errors
    /// [`ConfigurationError::InvalidValue`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.parsed_site_url()?;

        if self.graph.page_size == 0 {
            return Err(ConfigurationError::InvalidValue {
                field: "graph.page_size",
                reason: "must be greater than 0".into(),
            });
        }
        if url::Url::parse(&self.graph.base_url).is_err() {
            return Err(ConfigurationError::InvalidValue {
                field: "graph.base_url",
                reason: format!("not an absolute URL: {}", self.graph.base_url),
            });
        }
        if !VALID_LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(ConfigurationError::InvalidValue {
                field: "logging.level",
                reason: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }
        Ok(())
    }

    /// The site URL, validated
    ///
    /// # Errors
    /// [`ConfigurationError::InvalidValue`] for `site_url`.
    pub fn parsed_site_url(&self) -> Result<SiteUrl, ConfigurationError> {
        SiteUrl::parse(&self.site_url).map_err(|e| ConfigurationError::InvalidValue {
            field: "site_url",
            reason: e.to_string(),
        })
    }

    // --- builder-style overrides ---

    #[must_use]
    pub fn with_backend(mut self, backend: BackendPolicy) -> Self {
        self.backend = backend;
        self
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.graph.page_size = page_size;
        self
    }

    #[must_use]
    pub fn with_graph_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.graph.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_logging_level(mut self, level: impl Into<String>) -> Self {
        self.logging.level = level.into();
        self
    }

    #[must_use]
    pub fn with_auth(mut self, auth: AuthConfig) -> Self {
        self.auth = Some(auth);
        self
    }
}
