//! spbridge Graph - Microsoft Graph drive-item backend
//!
//! Provides the [`FileBackend`](spbridge_core::FileBackend) implementation
//! that talks to SharePoint document libraries through Microsoft Graph:
//! - Site and library resolution from server-relative paths
//! - Paged listings following `@odata.nextLink`
//! - Streaming downloads and single-request uploads (up to 250 MiB)
//! - Move, rename, recycle and folder creation on drive items
//!
//! ## Modules
//!
//! - [`client`] - Authenticated HTTP client for the Graph API
//! - [`drive`] - Site id, drive and drive-item path resolution
//! - [`paging`] - Collection requests across pages
//! - [`upload`] - Simple upload and its size ceiling
//! - [`provider`] - The `FileBackend` implementation

pub mod client;
pub mod drive;
pub mod paging;
pub mod provider;
pub mod upload;

pub use client::GraphClient;
pub use provider::GraphFileBackend;
