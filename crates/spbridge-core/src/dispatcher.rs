//! Backend selection and fallback
//!
//! [`Dispatcher`] is itself a [`FileBackend`]. Under [`BackendPolicy::Auto`]
//! every operation goes to Graph first and is repeated on the legacy API only
//! when Graph reports [`Error::BackendIncapable`]. Any other Graph failure is
//! returned as is.
//!
//! `BackendIncapable` never reaches the caller: when it is the final outcome
//! it becomes [`Error::Unsupported`].

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::domain::{
    validate_name, BackendKind, BackendPolicy, Error, FileRecord, FolderRecord, RemotePath, Result,
};
use crate::ports::{ConflictBehavior, FileBackend};

/// Runs `$call` against the backend(s) chosen by the policy.
///
/// `$call` is evaluated with `$backend` bound to `&Arc<dyn FileBackend>`; in
/// auto mode it may be evaluated twice.
macro_rules! dispatch {
    ($self:ident, $operation:literal, |$backend:ident| $call:expr) => {{
        match $self.policy {
            BackendPolicy::Graph => {
                let $backend = &$self.graph;
                finish($operation, $call)
            }
            BackendPolicy::Legacy => {
                let $backend = &$self.legacy;
                finish($operation, $call)
            }
            BackendPolicy::Auto => {
                let first = {
                    let $backend = &$self.graph;
                    $call
                };
                match first {
                    Err(Error::BackendIncapable { reason, .. }) => {
                        warn!(
                            operation = $operation,
                            reason = %reason,
                            "Graph backend cannot handle request, falling back to legacy API"
                        );
                        let $backend = &$self.legacy;
                        finish($operation, $call)
                    }
                    other => other,
                }
            }
        }
    }};
}

/// Converts a final backend incapability into [`Error::Unsupported`]
fn finish<T>(operation: &'static str, result: Result<T>) -> Result<T> {
    result.map_err(|err| match err {
        Error::BackendIncapable { backend, reason } => Error::Unsupported {
            operation,
            backend,
            reason,
        },
        other => other,
    })
}

/// Routes file operations to the Graph or legacy backend
#[derive(Clone)]
pub struct Dispatcher {
    policy: BackendPolicy,
    graph: Arc<dyn FileBackend>,
    legacy: Arc<dyn FileBackend>,
}

impl Dispatcher {
    pub fn new(
        policy: BackendPolicy,
        graph: Arc<dyn FileBackend>,
        legacy: Arc<dyn FileBackend>,
    ) -> Self {
        debug!(policy = %policy, "Creating dispatcher");
        Self {
            policy,
            graph,
            legacy,
        }
    }

    #[must_use]
    pub fn policy(&self) -> BackendPolicy {
        self.policy
    }

    /// The backend tried first under the current policy
    #[must_use]
    pub fn primary(&self) -> BackendKind {
        match self.policy {
            BackendPolicy::Legacy => BackendKind::Legacy,
            BackendPolicy::Graph | BackendPolicy::Auto => BackendKind::Graph,
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl FileBackend for Dispatcher {
    async fn list_files_in_folder(
        &self,
        folder_path: &str,
        keep_metadata: bool,
    ) -> Result<Vec<FileRecord>> {
        let folder = RemotePath::parse(folder_path)?;
        dispatch!(self, "list_files_in_folder", |backend| backend
            .list_files_in_folder(folder.as_str(), keep_metadata)
            .await)
    }

    async fn list_folders_in_folder(
        &self,
        folder_path: &str,
        keep_metadata: bool,
    ) -> Result<Vec<FolderRecord>> {
        let folder = RemotePath::parse(folder_path)?;
        dispatch!(self, "list_folders_in_folder", |backend| backend
            .list_folders_in_folder(folder.as_str(), keep_metadata)
            .await)
    }

    // The recursive walks run entirely on one backend, so a fallback
    // restarts the walk instead of mixing records from both APIs.
    async fn recursively_list_files(
        &self,
        folder_path: &str,
        keep_metadata: bool,
    ) -> Result<Vec<FileRecord>> {
        let folder = RemotePath::parse(folder_path)?;
        dispatch!(self, "recursively_list_files", |backend| backend
            .recursively_list_files(folder.as_str(), keep_metadata)
            .await)
    }

    async fn recursively_list_folders(
        &self,
        folder_path: &str,
        keep_metadata: bool,
    ) -> Result<Vec<FolderRecord>> {
        let folder = RemotePath::parse(folder_path)?;
        dispatch!(self, "recursively_list_folders", |backend| backend
            .recursively_list_folders(folder.as_str(), keep_metadata)
            .await)
    }

    async fn download_file(&self, source_path: &str, destination_path: &Path) -> Result<()> {
        let source = RemotePath::parse(source_path)?;
        dispatch!(self, "download_file", |backend| backend
            .download_file(source.as_str(), destination_path)
            .await)
    }

    async fn upload_file(
        &self,
        source_path: &Path,
        destination_folder_path: &str,
    ) -> Result<FileRecord> {
        let destination = RemotePath::parse(destination_folder_path)?;
        dispatch!(self, "upload_file", |backend| backend
            .upload_file(source_path, destination.as_str())
            .await)
    }

    async fn move_file_to_folder(
        &self,
        source_file_path: &str,
        destination_folder_path: &str,
        on_conflict: ConflictBehavior,
    ) -> Result<FileRecord> {
        let source = RemotePath::parse(source_file_path)?;
        let destination = RemotePath::parse(destination_folder_path)?;
        dispatch!(self, "move_file_to_folder", |backend| backend
            .move_file_to_folder(source.as_str(), destination.as_str(), on_conflict)
            .await)
    }

    async fn rename_file(
        &self,
        file_path: &str,
        new_name: &str,
        on_conflict: ConflictBehavior,
    ) -> Result<FileRecord> {
        let file = RemotePath::parse(file_path)?;
        validate_name(new_name)?;
        dispatch!(self, "rename_file", |backend| backend
            .rename_file(file.as_str(), new_name, on_conflict)
            .await)
    }

    async fn recycle_file(&self, file_path: &str) -> Result<()> {
        let file = RemotePath::parse(file_path)?;
        dispatch!(self, "recycle_file", |backend| backend
            .recycle_file(file.as_str())
            .await)
    }

    async fn create_folder_if_not_exists(&self, folder_path: &str) -> Result<FolderRecord> {
        let folder = RemotePath::parse(folder_path)?;
        dispatch!(self, "create_folder_if_not_exists", |backend| backend
            .create_folder_if_not_exists(folder.as_str())
            .await)
    }

    async fn folder_exists(&self, folder_path: &str) -> Result<bool> {
        let folder = RemotePath::parse(folder_path)?;
        dispatch!(self, "folder_exists", |backend| backend
            .folder_exists(folder.as_str())
            .await)
    }
}
