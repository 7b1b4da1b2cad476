//! Domain types
//!
//! - Backend identity and the dispatcher's selection policy
//! - Canonical file and folder records
//! - Remote path and site URL validation
//! - The error taxonomy shared by all backends

pub mod backend;
pub mod errors;
pub mod paths;
pub mod records;

pub use backend::{BackendKind, BackendPolicy};
pub use errors::{Error, Result, SchemaError, ValidationError};
pub use paths::{validate_name, RemotePath, SiteUrl, DISALLOWED_CHARACTERS};
pub use records::{FileRecord, FolderRecord};
