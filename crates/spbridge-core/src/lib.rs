//! spbridge Core - Records, path rules and backend selection
//!
//! This crate contains the backend-independent half of spbridge:
//! - **Domain types** - `FileRecord`, `FolderRecord`, `RemotePath`, `SiteUrl`, the error taxonomy
//! - **Port definition** - the `FileBackend` trait that each API adapter implements
//! - **Normalization** - backend-native metadata to canonical records
//! - **Dispatcher** - `graph | legacy | auto` routing with fallback on backend incapability
//! - **Configuration** - the YAML client configuration
//! - **Transfer helpers** - streaming downloads to disk, upload source checks
//!
//! # Architecture
//!
//! The crate follows the hexagonal (ports & adapters) pattern. Adapter crates
//! depend on this one and implement [`FileBackend`]; the dispatcher only ever
//! sees `Arc<dyn FileBackend>`.

pub mod config;
pub mod dispatcher;
pub mod domain;
pub mod normalize;
pub mod ports;
pub mod remote;
pub mod transfer;

pub use config::{ClientConfig, GraphConfig, ListOptions, LoggingConfig};
pub use dispatcher::Dispatcher;
pub use domain::{
    BackendKind, BackendPolicy, Error, FileRecord, FolderRecord, RemotePath, Result, SchemaError,
    SiteUrl, ValidationError,
};
pub use normalize::{normalize_file, normalize_folder};
pub use ports::{ConflictBehavior, FileBackend};
