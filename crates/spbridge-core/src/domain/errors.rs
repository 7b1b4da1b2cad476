//! Error taxonomy shared by every backend and the dispatcher
//!
//! Adapters translate transport and HTTP failures into [`Error`] so callers
//! never see backend-specific error types. [`Error::BackendIncapable`] is
//! internal to the dispatcher; callers receive [`Error::Unsupported`]
//! instead.

use spbridge_auth::{AuthenticationError, ConfigurationError};
use thiserror::Error;

use super::backend::BackendKind;

/// Result alias used throughout spbridge
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors returned by file and folder operations
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid settings, reported before any I/O
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// A token could not be obtained or was refused
    #[error(transparent)]
    Authentication(#[from] AuthenticationError),

    /// A path or name was rejected before any I/O
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The file, folder or local source does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The target already exists or was modified concurrently
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The caller lacks permission for the operation
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The backend cannot perform this operation or address this resource
    #[error("The {backend} backend cannot perform this operation: {reason}")]
    BackendIncapable {
        /// Backend that declined
        backend: BackendKind,
        /// Why it declined
        reason: String,
    },

    /// No permitted backend can perform the operation
    #[error("{operation} is not supported by the {backend} backend: {reason}")]
    Unsupported {
        /// Operation name, e.g. `move_file_to_folder`
        operation: &'static str,
        /// Last backend tried
        backend: BackendKind,
        /// Reason given by that backend
        reason: String,
    },

    /// Backend metadata did not have the expected shape
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Any other remote failure
    #[error("Remote error (HTTP {status}) {code}: {message}")]
    Remote {
        status: u16,
        code: String,
        message: String,
    },

    /// Transport failure
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Local filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True only for [`Error::BackendIncapable`], the sole fallback trigger
    #[must_use]
    pub fn is_backend_incapable(&self) -> bool {
        matches!(self, Error::BackendIncapable { .. })
    }

    /// True for [`Error::NotFound`]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    pub fn incapable(backend: BackendKind, reason: impl Into<String>) -> Self {
        Error::BackendIncapable {
            backend,
            reason: reason.into(),
        }
    }
}

/// A path or name that is refused before any request is made
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Characters the remote APIs cannot round-trip (`#`, `%`)
    #[error("Path contains disallowed character {character:?}: {path}")]
    DisallowedCharacter { character: char, path: String },

    #[error("Path is empty")]
    EmptyPath,

    #[error("Path contains a parent traversal segment: {0}")]
    ParentTraversal(String),

    /// A single name (file or folder) is not usable
    #[error("Invalid name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("Invalid site URL: {0}")]
    InvalidSiteUrl(String),
}

/// Backend metadata that cannot be normalised
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("{backend} item is missing {field}")]
    MissingField {
        backend: BackendKind,
        field: &'static str,
    },

    #[error("Invalid {field} value: {value}")]
    InvalidValue { field: &'static str, value: String },
}
