//! spbridge Legacy - SharePoint REST backend
//!
//! Provides the [`FileBackend`](spbridge_core::FileBackend) implementation
//! that talks to the site's own `_api/web` endpoint. It addresses files and
//! folders directly by server-relative path, so it handles shapes Graph
//! cannot (lists without a drive, site-level folders).
//!
//! ## Modules
//!
//! - [`client`] - Authenticated HTTP client scoped to one site
//! - [`endpoints`] - `_api/web` resource paths
//! - [`paging`] - Collection requests across pages
//! - [`provider`] - The `FileBackend` implementation

pub mod client;
pub mod endpoints;
pub mod paging;
pub mod provider;

pub use client::LegacyClient;
pub use provider::LegacyFileBackend;
