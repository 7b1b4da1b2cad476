//! Upload operations for Microsoft Graph API
//!
//! Only the single-request upload is used: `PUT {folder}/{name}:/content`
//! with the file as the body. Graph accepts up to 250 MiB this way; larger
//! files are reported as beyond this backend so the dispatcher can decide
//! what to do.
//!
//! ## Microsoft Graph API References
//!
//! - [Upload small files](https://learn.microsoft.com/en-us/graph/api/driveitem-put-content)

use std::path::Path;

use reqwest::Method;
use serde_json::{Map, Value};
use spbridge_core::transfer::{file_body, UploadSource};
use spbridge_core::{BackendKind, Result};
use tracing::debug;

use crate::client::GraphClient;
use crate::drive::DriveItemRef;

/// Simple-upload ceiling: 250 MiB
pub const MAX_SIMPLE_UPLOAD: u64 = 250 * 1024 * 1024;

/// Checks the local file against the simple-upload ceiling
///
/// # Errors
/// `NotFound` for a missing source, `BackendIncapable` when it is too large.
pub async fn prepare(source_path: &Path) -> Result<UploadSource> {
    let source = UploadSource::inspect(source_path).await?;
    source.check_ceiling(BackendKind::Graph, MAX_SIMPLE_UPLOAD)?;
    Ok(source)
}

/// Uploads `source_path` as `folder/{source.name}`, replacing any existing
/// file, and returns the created drive item
///
/// # Errors
/// Request errors as mapped by [`GraphClient::send`].
pub async fn upload_small(
    client: &GraphClient,
    folder: &DriveItemRef,
    source_path: &Path,
    source: &UploadSource,
) -> Result<Map<String, Value>> {
    let target = folder.child(&source.name);
    let path = format!("{}/content", target.item_path());
    debug!(bytes = source.len, name = %source.name, path = %path, "Uploading small file");

    let request = client
        .request(Method::PUT, &path)
        .await?
        .header("Content-Type", "application/octet-stream")
        .header("Content-Length", source.len)
        .body(file_body(source_path).await?);

    let item = client.send(request, &source.name).await?.json().await?;
    Ok(item)
}
