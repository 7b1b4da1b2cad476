//! Local side of downloads and uploads
//!
//! Both adapters stream response bodies to disk the same way and check
//! upload sources the same way, so a missing local file is `NotFound` on
//! either backend.

use std::path::Path;

use futures_util::StreamExt;
use reqwest::{Body, Response};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::domain::{validate_name, Error, Result};

/// A local file about to be uploaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSource {
    /// File name used for the remote item
    pub name: String,
    /// Size in bytes
    pub len: u64,
}

impl UploadSource {
    /// Checks that `path` is a readable regular file with a usable name
    ///
    /// # Errors
    /// [`Error::NotFound`] when the file does not exist or is a directory,
    /// [`Error::Validation`] when its name cannot be used remotely.
    pub async fn inspect(path: &Path) -> Result<Self> {
        let metadata = match tokio::fs::metadata(path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::NotFound(path.display().to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        if !metadata.is_file() {
            return Err(Error::NotFound(path.display().to_string()));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        validate_name(&name)?;

        Ok(Self {
            name,
            len: metadata.len(),
        })
    }

    /// Fails with [`Error::BackendIncapable`] when the file is larger than
    /// `ceiling` bytes
    ///
    /// # Errors
    /// See above.
    pub fn check_ceiling(&self, backend: crate::BackendKind, ceiling: u64) -> Result<()> {
        if self.len > ceiling {
            return Err(Error::incapable(
                backend,
                format!(
                    "{} is {} bytes, above the {} byte simple-upload limit",
                    self.name, self.len, ceiling
                ),
            ));
        }
        Ok(())
    }
}

/// Opens `path` as a streaming request body
///
/// # Errors
/// [`Error::Io`] when the file cannot be opened.
pub async fn file_body(path: &Path) -> Result<Body> {
    let file = tokio::fs::File::open(path).await?;
    Ok(Body::from(file))
}

/// Streams a successful response body into `destination`
///
/// Missing parent directories are created and an existing file is
/// truncated. Call only after the status has been checked, so a failed
/// request never touches the destination.
///
/// # Errors
/// [`Error::Io`] for local failures, [`Error::Network`] when the body
/// stream breaks.
pub async fn stream_to_file(response: Response, destination: &Path) -> Result<u64> {
    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let mut file = tokio::fs::File::create(destination).await?;
    let mut stream = response.bytes_stream();
    let mut written: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;

    debug!(bytes = written, path = %destination.display(), "Wrote download to disk");
    Ok(written)
}
