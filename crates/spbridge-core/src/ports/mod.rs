//! Port definitions
//!
//! [`FileBackend`] is the boundary between the dispatcher and the adapter
//! crates (`spbridge-graph`, `spbridge-legacy`).

pub mod file_backend;

pub use file_backend::{ConflictBehavior, FileBackend};
