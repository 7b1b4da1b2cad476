//! File backend port
//!
//! The interface every remote API adapter implements, and that the
//! dispatcher itself implements so callers can hold either one.
//!
//! ## Implementation Notes
//!
//! - Remote paths are passed as strings and must go through
//!   [`RemotePath::parse`](crate::domain::RemotePath::parse) before any request
//!   is made, so a bad path fails the same way on every backend.
//! - Return [`Error::BackendIncapable`](crate::Error::BackendIncapable) only
//!   when the backend cannot perform the operation or address the resource at
//!   all. Every other failure is a genuine failure and is never retried on
//!   another backend.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::{FileRecord, FolderRecord, RemotePath, Result};

/// What to do when the target of a move or rename already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictBehavior {
    /// Return [`Error::Conflict`](crate::Error::Conflict)
    #[default]
    Fail,
    /// Overwrite the existing file
    Replace,
}

impl ConflictBehavior {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ConflictBehavior::Fail => "fail",
            ConflictBehavior::Replace => "replace",
        }
    }
}

/// File and folder operations against one remote document store
#[async_trait]
pub trait FileBackend: Send + Sync {
    /// Files directly inside `folder_path`, every page
    async fn list_files_in_folder(
        &self,
        folder_path: &str,
        keep_metadata: bool,
    ) -> Result<Vec<FileRecord>>;

    /// Folders directly inside `folder_path`, every page
    async fn list_folders_in_folder(
        &self,
        folder_path: &str,
        keep_metadata: bool,
    ) -> Result<Vec<FolderRecord>>;

    /// Files in `folder_path` and all of its subfolders
    ///
    /// Depth-first: a folder's own files come before its subfolders' files.
    /// Subfolders whose path cannot be addressed (a `#` or `%` in a name)
    /// are skipped with a warning.
    async fn recursively_list_files(
        &self,
        folder_path: &str,
        keep_metadata: bool,
    ) -> Result<Vec<FileRecord>> {
        let mut files = Vec::new();
        let mut pending = vec![folder_path.to_string()];

        while let Some(folder) = pending.pop() {
            files.extend(self.list_files_in_folder(&folder, keep_metadata).await?);
            let subfolders = self.list_folders_in_folder(&folder, false).await?;
            // Visit the first subfolder next, so push in reverse
            pending.extend(
                subfolders
                    .iter()
                    .rev()
                    .map(|sub| child_path(&folder, sub))
                    .filter(|path| addressable(path)),
            );
        }

        Ok(files)
    }

    /// Folders below `folder_path` at any depth, in depth-first order
    ///
    /// A folder that cannot be addressed is still returned, but its
    /// contents are not listed.
    async fn recursively_list_folders(
        &self,
        folder_path: &str,
        keep_metadata: bool,
    ) -> Result<Vec<FolderRecord>> {
        let mut folders = Vec::new();
        let mut pending = Vec::new();
        let top = self.list_folders_in_folder(folder_path, keep_metadata).await?;
        push_children(&mut pending, folder_path, top);

        while let Some((path, folder)) = pending.pop() {
            folders.push(folder);
            if !addressable(&path) {
                continue;
            }
            let subfolders = self.list_folders_in_folder(&path, keep_metadata).await?;
            push_children(&mut pending, &path, subfolders);
        }

        Ok(folders)
    }

    /// Streams a remote file to `destination_path`
    ///
    /// Missing parent directories are created and an existing file is
    /// overwritten. When the source does not exist the destination is left
    /// untouched.
    async fn download_file(&self, source_path: &str, destination_path: &Path) -> Result<()>;

    /// Uploads a local file into `destination_folder_path`, replacing any
    /// file of the same name
    async fn upload_file(
        &self,
        source_path: &Path,
        destination_folder_path: &str,
    ) -> Result<FileRecord>;

    async fn move_file_to_folder(
        &self,
        source_file_path: &str,
        destination_folder_path: &str,
        on_conflict: ConflictBehavior,
    ) -> Result<FileRecord>;

    /// Renames a file within its folder; `new_name` is a name, not a path
    async fn rename_file(
        &self,
        file_path: &str,
        new_name: &str,
        on_conflict: ConflictBehavior,
    ) -> Result<FileRecord>;

    /// Moves a file to the recycle bin
    async fn recycle_file(&self, file_path: &str) -> Result<()>;

    /// Creates `folder_path` and any missing parents; returns the existing
    /// folder when it is already there
    async fn create_folder_if_not_exists(&self, folder_path: &str) -> Result<FolderRecord>;

    /// `Ok(false)` only when the backend answers "not found"
    async fn folder_exists(&self, folder_path: &str) -> Result<bool>;
}

/// Path of a listed subfolder, preferring the server-reported one
fn child_path(parent: &str, folder: &FolderRecord) -> String {
    match &folder.server_relative_path {
        Some(path) => path.clone(),
        None => format!("{}/{}", parent.trim_end_matches('/'), folder.name),
    }
}

/// Whether a server-reported folder path can be listed in turn
///
/// SharePoint allows `#` and `%` in folder names, which [`RemotePath`] rejects.
fn addressable(path: &str) -> bool {
    match RemotePath::parse(path) {
        Ok(_) => true,
        Err(err) => {
            warn!(path, error = %err, "Skipping subfolder that cannot be addressed");
            false
        }
    }
}

/// Queues subfolders so the first one is visited next
fn push_children(
    pending: &mut Vec<(String, FolderRecord)>,
    parent: &str,
    subfolders: Vec<FolderRecord>,
) {
    for folder in subfolders.into_iter().rev() {
        let path = child_path(parent, &folder);
        pending.push((path, folder));
    }
}
