//! Error types for configuration and token acquisition
//!
//! Configuration problems surface while an [`AuthConfig`](crate::AuthConfig)
//! or a credential is being built. Authentication problems surface only when
//! a token is actually requested. Neither type ever carries a secret value.

use std::path::PathBuf;

use thiserror::Error;

/// Invalid or incomplete authentication settings
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// The strategy tag is not one of the supported strategies
    #[error("Unknown authentication strategy: {0}")]
    UnknownStrategy(String),

    /// A field required by the selected strategy is absent or empty
    #[error("{strategy} requires {field}")]
    MissingField {
        /// Strategy tag that needs the field
        strategy: &'static str,
        /// Name of the missing field
        field: &'static str,
    },

    /// A configured path does not exist on the local filesystem
    #[error("Path does not exist: {}", .0.display())]
    PathNotFound(PathBuf),

    /// A field is present but its value cannot be used
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue {
        /// Name of the offending field
        field: &'static str,
        /// Human-readable explanation (never contains the value of a secret)
        reason: String,
    },

    /// Legacy keyword arguments did not map to any strategy
    #[error("Could not determine authentication strategy: {0}")]
    Undetermined(String),

    /// The configuration file could not be read or parsed
    #[error("Failed to load configuration: {0}")]
    Load(String),
}

/// Failure to obtain a bearer token
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthenticationError {
    /// The identity provider rejected the request (invalid credentials,
    /// consent required, expired certificate, ...)
    #[error("{credential} token request was rejected: {message}")]
    Rejected {
        /// Credential kind that made the request
        credential: &'static str,
        /// Provider error description
        message: String,
    },

    /// The credential source is not usable in this environment
    #[error("{credential} is unavailable: {message}")]
    Unavailable {
        /// Credential kind
        credential: &'static str,
        /// Why the source cannot be used
        message: String,
    },

    /// Local material (certificate, key) could not be loaded
    #[error("{credential} could not load credential material: {message}")]
    Material {
        /// Credential kind
        credential: &'static str,
        /// What went wrong
        message: String,
    },

    /// Every credential in the default chain failed
    #[error("No credential in the default chain succeeded: {}", .0.join("; "))]
    ChainExhausted(Vec<String>),
}

impl AuthenticationError {
    pub(crate) fn rejected(credential: &'static str, message: impl Into<String>) -> Self {
        Self::Rejected {
            credential,
            message: message.into(),
        }
    }

    pub(crate) fn unavailable(credential: &'static str, message: impl Into<String>) -> Self {
        Self::Unavailable {
            credential,
            message: message.into(),
        }
    }

    pub(crate) fn material(credential: &'static str, message: impl Into<String>) -> Self {
        Self::Material {
            credential,
            message: message.into(),
        }
    }
}

/// The URL given to a scope helper is not absolute
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScopeError {
    /// Missing scheme or host
    #[error("site_url must be an absolute URL: {0}")]
    InvalidUrl(String),
}
