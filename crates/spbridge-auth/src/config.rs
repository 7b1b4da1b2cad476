//! Authentication configuration
//!
//! [`AuthConfig`] is the single, validated description of how to obtain
//! bearer tokens. It is built once (from the environment, a YAML file, a
//! [`AuthConfigBuilder`], or deprecated keyword arguments), checked against
//! the requirements of its [`Strategy`], and then passed down unchanged.
//!
//! Secret-valued fields are held as [`SecretString`] and never appear in
//! `Debug` output.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

use crate::error::ConfigurationError;

/// Default Microsoft identity platform host
pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// Default redirect URI for the interactive browser flow
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:8400";

/// Default Azure Instance Metadata Service token endpoint
pub const DEFAULT_MANAGED_IDENTITY_ENDPOINT: &str =
    "http://169.254.169.254/metadata/identity/oauth2/token";

/// Prefix shared by every environment variable read by [`AuthConfig::from_env`]
pub const ENV_PREFIX: &str = "AZURE_";

const REDACTED: &str = "[REDACTED]";

// ============================================================================
// Strategy
// ============================================================================

/// Supported authentication strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Chain of environment, managed identity and Azure CLI credentials
    #[default]
    Default,
    /// Token from the locally logged-in Azure CLI
    Cli,
    /// Azure managed identity (system- or user-assigned)
    ManagedIdentity,
    /// App registration with a client secret
    ClientSecret,
    /// App registration with a certificate
    ClientCertificate,
    /// Authorization code flow in the user's browser
    InteractiveBrowser,
    /// Resource owner password grant. Deprecated by Microsoft on
    /// 30 September 2025; kept for existing app registrations.
    UsernamePassword,
}

impl Strategy {
    /// Every strategy, in declaration order
    pub const ALL: [Strategy; 7] = [
        Strategy::Default,
        Strategy::Cli,
        Strategy::ManagedIdentity,
        Strategy::ClientSecret,
        Strategy::ClientCertificate,
        Strategy::InteractiveBrowser,
        Strategy::UsernamePassword,
    ];

    /// The configuration tag for this strategy
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Default => "default",
            Strategy::Cli => "cli",
            Strategy::ManagedIdentity => "managed_identity",
            Strategy::ClientSecret => "client_secret",
            Strategy::ClientCertificate => "client_certificate",
            Strategy::InteractiveBrowser => "interactive_browser",
            Strategy::UsernamePassword => "username_password",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_ascii_lowercase();
        Strategy::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == tag)
            .ok_or_else(|| ConfigurationError::UnknownStrategy(s.to_string()))
    }
}

// ============================================================================
// StrategyParams
// ============================================================================

/// Validated, strategy-specific parameters
///
/// Produced by [`AuthConfig::resolve`]. Each variant carries exactly the
/// fields its credential needs, so the factory never re-checks presence.
#[derive(Clone)]
pub enum StrategyParams {
    Default {
        tenant_id: Option<String>,
        client_id: Option<String>,
        client_secret: Option<SecretString>,
        certificate_path: Option<PathBuf>,
        certificate_password: Option<SecretString>,
    },
    Cli {
        tenant_id: Option<String>,
    },
    ManagedIdentity {
        client_id: Option<String>,
    },
    ClientSecret {
        tenant_id: String,
        client_id: String,
        client_secret: SecretString,
    },
    ClientCertificate {
        tenant_id: String,
        client_id: String,
        certificate_path: PathBuf,
        certificate_password: Option<SecretString>,
    },
    InteractiveBrowser {
        tenant_id: String,
        client_id: String,
        redirect_uri: Url,
    },
    UsernamePassword {
        tenant_id: String,
        client_id: String,
        username: String,
        password: SecretString,
        client_secret: SecretString,
    },
}

impl StrategyParams {
    /// The strategy these parameters belong to
    pub fn strategy(&self) -> Strategy {
        match self {
            StrategyParams::Default { .. } => Strategy::Default,
            StrategyParams::Cli { .. } => Strategy::Cli,
            StrategyParams::ManagedIdentity { .. } => Strategy::ManagedIdentity,
            StrategyParams::ClientSecret { .. } => Strategy::ClientSecret,
            StrategyParams::ClientCertificate { .. } => Strategy::ClientCertificate,
            StrategyParams::InteractiveBrowser { .. } => Strategy::InteractiveBrowser,
            StrategyParams::UsernamePassword { .. } => Strategy::UsernamePassword,
        }
    }
}

impl fmt::Debug for StrategyParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyParams")
            .field("strategy", &self.strategy())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// AuthConfig
// ============================================================================

/// Immutable, validated authentication configuration
#[derive(Clone, Deserialize)]
#[serde(try_from = "AuthConfigBuilder")]
pub struct AuthConfig {
    strategy: Strategy,
    tenant_id: Option<String>,
    client_id: Option<String>,
    client_secret: Option<SecretString>,
    certificate_path: Option<PathBuf>,
    certificate_password: Option<SecretString>,
    username: Option<String>,
    password: Option<SecretString>,
    redirect_uri: String,
    authority_host: Url,
    managed_identity_endpoint: Url,
}

impl AuthConfig {
    /// Starts a builder with every field unset
    pub fn builder() -> AuthConfigBuilder {
        AuthConfigBuilder::default()
    }

    /// Reads `AZURE_*` variables from the process environment once
    ///
    /// # Errors
    /// Any [`ConfigurationError`] raised by validation.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_vars(std::env::vars())
    }

    /// Builds a config from `(name, value)` pairs using the `AZURE_*` names
    ///
    /// Names are matched case-insensitively. Unrelated variables are ignored.
    ///
    /// # Errors
    /// Any [`ConfigurationError`] raised by validation.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut builder = AuthConfigBuilder::default();

        for (key, value) in vars {
            let key = key.as_ref().to_ascii_uppercase();
            let Some(name) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let value: String = value.into();
            match name {
                "AUTH_STRATEGY" => builder.strategy = Some(value),
                "TENANT_ID" => builder.tenant_id = Some(value),
                // The dedicated managed identity alias wins over the generic one
                "CLIENT_ID" => {
                    builder.client_id.get_or_insert(value);
                }
                "MANAGED_IDENTITY_CLIENT_ID" => builder.client_id = Some(value),
                "CLIENT_SECRET" => builder.client_secret = Some(SecretString::new(value)),
                "CLIENT_CERTIFICATE_PATH" => builder.certificate_path = Some(PathBuf::from(value)),
                "CLIENT_CERTIFICATE_PASSWORD" => {
                    builder.certificate_password = Some(SecretString::new(value))
                }
                "USERNAME" => builder.username = Some(value),
                "PASSWORD" => builder.password = Some(SecretString::new(value)),
                "REDIRECT_URI" => builder.redirect_uri = Some(value),
                "AUTHORITY_HOST" => builder.authority_host = Some(value),
                "MANAGED_IDENTITY_ENDPOINT" => builder.managed_identity_endpoint = Some(value),
                _ => {}
            }
        }

        builder.build()
    }

    /// Loads a YAML file shaped like the builder's fields
    ///
    /// # Errors
    /// [`ConfigurationError::Load`] when the file cannot be read or parsed,
    /// otherwise any validation error.
    pub fn load(path: &Path) -> Result<Self, ConfigurationError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigurationError::Load(format!("{}: {e}", path.display())))?;
        let builder: AuthConfigBuilder = serde_yaml::from_str(&content)
            .map_err(|e| ConfigurationError::Load(format!("{}: {e}", path.display())))?;
        builder.build()
    }

    /// Translates the deprecated keyword set into a config
    ///
    /// Strategies are tried in order: interactive browser, client secret,
    /// client certificate, username/password. A username or password
    /// without a full app registration is rejected.
    ///
    /// # Errors
    /// [`ConfigurationError::Undetermined`] when nothing matches.
    pub fn from_legacy_args(args: LegacyAuthArgs) -> Result<Self, ConfigurationError> {
        warn!(
            "Passing credential arguments directly is deprecated; construct an AuthConfig instead"
        );

        let LegacyAuthArgs {
            username,
            password,
            client_id,
            client_secret,
            interactive_auth,
            tenant_id,
            certificate_path,
        } = args;

        let builder = AuthConfig::builder();

        match (&tenant_id, &client_id) {
            (Some(tenant), Some(client)) if interactive_auth => {
                return builder
                    .strategy(Strategy::InteractiveBrowser)
                    .tenant_id(tenant.clone())
                    .client_id(client.clone())
                    .build();
            }
            (Some(tenant), Some(client)) => {
                if let Some(secret) = &client_secret {
                    if username.is_none() && password.is_none() {
                        return builder
                            .strategy(Strategy::ClientSecret)
                            .tenant_id(tenant.clone())
                            .client_id(client.clone())
                            .client_secret(secret.clone())
                            .build();
                    }
                }
                if let Some(path) = certificate_path {
                    return builder
                        .strategy(Strategy::ClientCertificate)
                        .tenant_id(tenant.clone())
                        .client_id(client.clone())
                        .certificate_path(path)
                        .build();
                }
                if let (Some(user), Some(pass), Some(secret)) = (&username, &password, &client_secret)
                {
                    return builder
                        .strategy(Strategy::UsernamePassword)
                        .tenant_id(tenant.clone())
                        .client_id(client.clone())
                        .client_secret(secret.clone())
                        .username(user.clone())
                        .password(pass.clone())
                        .build();
                }
            }
            _ => {}
        }

        if username.is_some() || password.is_some() {
            return Err(ConfigurationError::Undetermined(
                "username/password without an app registration is no longer supported; \
                 use interactive_browser, client_secret or client_certificate"
                    .to_string(),
            ));
        }

        Err(ConfigurationError::Undetermined(
            "provide tenant_id and client_id with client_secret, certificate_path or interactive_auth"
                .to_string(),
        ))
    }

    /// Resolves the strategy-specific parameters
    ///
    /// # Errors
    /// [`ConfigurationError::MissingField`] when a required field is absent
    /// and [`ConfigurationError::PathNotFound`] when a certificate path does
    /// not exist (checked at call time).
    pub fn resolve(&self) -> Result<StrategyParams, ConfigurationError> {
        let strategy = self.strategy.as_str();
        let need_str = |value: &Option<String>, field: &'static str| {
            value
                .clone()
                .ok_or(ConfigurationError::MissingField { strategy, field })
        };
        let need_secret = |value: &Option<SecretString>, field: &'static str| {
            value
                .clone()
                .ok_or(ConfigurationError::MissingField { strategy, field })
        };

        let params = match self.strategy {
            Strategy::Default => StrategyParams::Default {
                tenant_id: self.tenant_id.clone(),
                client_id: self.client_id.clone(),
                client_secret: self.client_secret.clone(),
                certificate_path: self.certificate_path.clone(),
                certificate_password: self.certificate_password.clone(),
            },
            Strategy::Cli => StrategyParams::Cli {
                tenant_id: self.tenant_id.clone(),
            },
            Strategy::ManagedIdentity => StrategyParams::ManagedIdentity {
                client_id: self.client_id.clone(),
            },
            Strategy::ClientSecret => StrategyParams::ClientSecret {
                tenant_id: need_str(&self.tenant_id, "tenant_id")?,
                client_id: need_str(&self.client_id, "client_id")?,
                client_secret: need_secret(&self.client_secret, "client_secret")?,
            },
            Strategy::ClientCertificate => StrategyParams::ClientCertificate {
                tenant_id: need_str(&self.tenant_id, "tenant_id")?,
                client_id: need_str(&self.client_id, "client_id")?,
                certificate_path: self.certificate_path.clone().ok_or(
                    ConfigurationError::MissingField {
                        strategy,
                        field: "certificate_path",
                    },
                )?,
                certificate_password: self.certificate_password.clone(),
            },
            Strategy::InteractiveBrowser => StrategyParams::InteractiveBrowser {
                tenant_id: need_str(&self.tenant_id, "tenant_id")?,
                client_id: need_str(&self.client_id, "client_id")?,
                redirect_uri: parse_url("redirect_uri", &self.redirect_uri)?,
            },
            Strategy::UsernamePassword => StrategyParams::UsernamePassword {
                tenant_id: need_str(&self.tenant_id, "tenant_id")?,
                client_id: need_str(&self.client_id, "client_id")?,
                username: need_str(&self.username, "username")?,
                password: need_secret(&self.password, "password")?,
                client_secret: need_secret(&self.client_secret, "client_secret")?,
            },
        };

        if let Some(path) = &self.certificate_path {
            ensure_exists(path)?;
        }

        Ok(params)
    }

    /// Selected strategy
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Directory (tenant) id, if configured
    pub fn tenant_id(&self) -> Option<&str> {
        self.tenant_id.as_deref()
    }

    /// Application (client) id, if configured
    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    /// Certificate path, if configured
    pub fn certificate_path(&self) -> Option<&Path> {
        self.certificate_path.as_deref()
    }

    /// Username for the password grant, if configured
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Redirect URI for the interactive flow
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Identity platform host, without a trailing slash
    pub fn authority_host(&self) -> &str {
        self.authority_host.as_str().trim_end_matches('/')
    }

    /// Managed identity token endpoint
    pub fn managed_identity_endpoint(&self) -> &Url {
        &self.managed_identity_endpoint
    }

    /// Whether a client secret is configured (the value stays hidden)
    pub fn has_client_secret(&self) -> bool {
        self.client_secret.is_some()
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |s: &Option<SecretString>| s.as_ref().map(|_| REDACTED);
        f.debug_struct("AuthConfig")
            .field("strategy", &self.strategy)
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &redact(&self.client_secret))
            .field("certificate_path", &self.certificate_path)
            .field("certificate_password", &redact(&self.certificate_password))
            .field("username", &self.username)
            .field("password", &redact(&self.password))
            .field("redirect_uri", &self.redirect_uri)
            .field("authority_host", &self.authority_host())
            .field(
                "managed_identity_endpoint",
                &self.managed_identity_endpoint.as_str(),
            )
            .finish()
    }
}

impl TryFrom<AuthConfigBuilder> for AuthConfig {
    type Error = ConfigurationError;

    fn try_from(builder: AuthConfigBuilder) -> Result<Self, Self::Error> {
        builder.build()
    }
}

fn ensure_exists(path: &Path) -> Result<(), ConfigurationError> {
    if path.exists() {
        Ok(())
    } else {
        Err(ConfigurationError::PathNotFound(path.to_path_buf()))
    }
}

fn parse_url(field: &'static str, value: &str) -> Result<Url, ConfigurationError> {
    let url = Url::parse(value).map_err(|e| ConfigurationError::InvalidValue {
        field,
        reason: e.to_string(),
    })?;
    if url.host_str().is_none() {
        return Err(ConfigurationError::InvalidValue {
            field,
            reason: "URL has no host".to_string(),
        });
    }
    Ok(url)
}

/// `login.microsoftonline.us` means `https://login.microsoftonline.us`
fn with_scheme(host: &str) -> String {
    let host = host.trim();
    if host.contains("://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

/// Drops empty strings so `FOO=` behaves like an unset variable
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// ============================================================================
// AuthConfigBuilder
// ============================================================================

/// Collects raw settings; [`build`](Self::build) validates them
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthConfigBuilder {
    strategy: Option<String>,
    tenant_id: Option<String>,
    #[serde(alias = "managed_identity_client_id")]
    client_id: Option<String>,
    client_secret: Option<SecretString>,
    certificate_path: Option<PathBuf>,
    certificate_password: Option<SecretString>,
    username: Option<String>,
    password: Option<SecretString>,
    redirect_uri: Option<String>,
    #[serde(alias = "authority")]
    authority_host: Option<String>,
    managed_identity_endpoint: Option<String>,
}

impl AuthConfigBuilder {
    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = Some(strategy.as_str().to_string());
        self
    }

    /// Sets the strategy from its textual tag; checked in [`build`](Self::build)
    pub fn strategy_tag(mut self, tag: impl Into<String>) -> Self {
        self.strategy = Some(tag.into());
        self
    }

    pub fn tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    pub fn client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(SecretString::new(secret.into()));
        self
    }

    pub fn certificate_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.certificate_path = Some(path.into());
        self
    }

    pub fn certificate_password(mut self, password: impl Into<String>) -> Self {
        self.certificate_password = Some(SecretString::new(password.into()));
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(SecretString::new(password.into()));
        self
    }

    pub fn redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(uri.into());
        self
    }

    pub fn authority_host(mut self, host: impl Into<String>) -> Self {
        self.authority_host = Some(host.into());
        self
    }

    pub fn managed_identity_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.managed_identity_endpoint = Some(endpoint.into());
        self
    }

    /// Validates and freezes the configuration
    ///
    /// # Errors
    /// Unknown strategy tag, missing strategy fields, non-existent
    /// certificate path or malformed URLs.
    pub fn build(self) -> Result<AuthConfig, ConfigurationError> {
        use secrecy::ExposeSecret;

        let strategy = match non_empty(self.strategy) {
            Some(tag) => tag.parse()?,
            None => Strategy::default(),
        };
        let secret = |s: Option<SecretString>| s.filter(|v| !v.expose_secret().is_empty());

        let config = AuthConfig {
            strategy,
            tenant_id: non_empty(self.tenant_id),
            client_id: non_empty(self.client_id),
            client_secret: secret(self.client_secret),
            certificate_path: self.certificate_path.filter(|p| !p.as_os_str().is_empty()),
            certificate_password: secret(self.certificate_password),
            username: non_empty(self.username),
            password: secret(self.password),
            redirect_uri: non_empty(self.redirect_uri)
                .unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string()),
            authority_host: parse_url(
                "authority_host",
                &with_scheme(
                    non_empty(self.authority_host)
                        .as_deref()
                        .unwrap_or(DEFAULT_AUTHORITY_HOST),
                ),
            )?,
            managed_identity_endpoint: parse_url(
                "managed_identity_endpoint",
                non_empty(self.managed_identity_endpoint)
                    .as_deref()
                    .unwrap_or(DEFAULT_MANAGED_IDENTITY_ENDPOINT),
            )?,
        };

        config.resolve()?;
        if strategy == Strategy::UsernamePassword {
            warn!("The username_password strategy is deprecated by Microsoft");
        }
        Ok(config)
    }
}

// ============================================================================
// LegacyAuthArgs
// ============================================================================

/// Deprecated credential keyword set accepted by older client constructors
#[derive(Clone, Default)]
pub struct LegacyAuthArgs {
    pub username: Option<String>,
    pub password: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub interactive_auth: bool,
    pub tenant_id: Option<String>,
    pub certificate_path: Option<PathBuf>,
}

impl fmt::Debug for LegacyAuthArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LegacyAuthArgs")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| REDACTED))
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| REDACTED))
            .field("interactive_auth", &self.interactive_auth)
            .field("tenant_id", &self.tenant_id)
            .field("certificate_path", &self.certificate_path)
            .finish()
    }
}
