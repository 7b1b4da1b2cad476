//! LegacyFileBackend - FileBackend implementation for SharePoint REST
//!
//! Paths are resolved against the site and sent as server-relative paths;
//! no drive lookup is involved.
//!
//! ## Design Notes
//!
//! - Uploads use `Files/add`, which takes the whole body in one request and
//!   is limited to 4 MiB; larger files are a backend incapability.
//! - `MoveTo` has no "fail if exists" answer the service reports reliably,
//!   so [`ConflictBehavior::Fail`] checks the target first.
//! - Renames are moves within the same folder.
//! - A missing folder may answer 404 or `"Exists": false`; both mean absent.

use std::path::Path;

use async_trait::async_trait;
use reqwest::header::CONTENT_LENGTH;
use reqwest::Method;
use serde_json::{Map, Value};
use spbridge_core::normalize::{normalize_file, normalize_folder};
use spbridge_core::transfer::{file_body, stream_to_file, UploadSource};
use spbridge_core::{
    BackendKind, ConflictBehavior, Error, FileBackend, FileRecord, FolderRecord, RemotePath,
    Result, SiteUrl, ValidationError,
};
use tracing::{debug, info};

use crate::client::LegacyClient;
use crate::{endpoints, paging};

/// `Files/add` ceiling: 4 MiB
pub const MAX_SIMPLE_UPLOAD: u64 = 4 * 1024 * 1024;

/// SharePoint REST implementation of [`FileBackend`]
#[derive(Debug, Clone)]
pub struct LegacyFileBackend {
    client: LegacyClient,
}

impl LegacyFileBackend {
    pub fn new(client: LegacyClient) -> Self {
        Self { client }
    }

    pub fn site(&self) -> &SiteUrl {
        self.client.site()
    }

    /// Validates `path` and makes it server-relative
    fn locate(&self, path: &str) -> Result<RemotePath> {
        let remote = RemotePath::parse(path)?;
        Ok(self.client.site().resolve(&remote))
    }

    /// Folder properties, `None` when the folder does not exist
    async fn folder_state(&self, path: &RemotePath) -> Result<Option<Map<String, Value>>> {
        match self
            .client
            .get_json::<Map<String, Value>>(&endpoints::folder(path), path.as_str())
            .await
        {
            Ok(folder) if reports_missing(&folder) => Ok(None),
            Ok(folder) => Ok(Some(folder)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn file_exists(&self, path: &RemotePath) -> Result<bool> {
        match self
            .client
            .get_json::<Map<String, Value>>(&endpoints::file(path), path.as_str())
            .await
        {
            Ok(file) => Ok(!reports_missing(&file)),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn require_folder(&self, path: &RemotePath) -> Result<Map<String, Value>> {
        self.folder_state(path)
            .await?
            .ok_or_else(|| Error::NotFound(path.to_string()))
    }

    /// `MoveTo` from `source` to the full `target` path
    async fn relocate(
        &self,
        source: &RemotePath,
        target: &RemotePath,
        on_conflict: ConflictBehavior,
    ) -> Result<FileRecord> {
        if on_conflict == ConflictBehavior::Fail && self.file_exists(target).await? {
            return Err(Error::Conflict(format!("{target} already exists")));
        }

        debug!(source = %source, target = %target, ?on_conflict, "Moving file");
        self.client
            .post_empty(&endpoints::move_to(source, target, on_conflict), source.as_str())
            .await?;

        let moved: Map<String, Value> = self
            .client
            .get_json(&endpoints::file(target), target.as_str())
            .await?;
        Ok(normalize_file(&moved, BackendKind::Legacy, false)?)
    }

    /// Creates the single folder `path`; one created concurrently is fetched
    /// instead
    async fn add_folder(&self, path: &RemotePath) -> Result<Map<String, Value>> {
        info!(folder = %path, "Creating folder");
        let request = self
            .client
            .request(Method::POST, &endpoints::add_folder(path))
            .await?
            .header(CONTENT_LENGTH, 0);

        match self.client.send(request, path.as_str()).await {
            Ok(response) => Ok(response.json().await?),
            Err(Error::Conflict(_)) => self.require_folder(path).await,
            Err(e) => Err(e),
        }
    }
}

/// `"Exists": false` in a 200 answer
fn reports_missing(properties: &Map<String, Value>) -> bool {
    properties.get("Exists").and_then(Value::as_bool) == Some(false)
}

fn file_name(path: &RemotePath) -> Result<&str> {
    path.name().ok_or_else(|| {
        Error::Validation(ValidationError::InvalidName {
            name: path.to_string(),
            reason: "path does not name a file",
        })
    })
}

#[async_trait]
impl FileBackend for LegacyFileBackend {
    async fn list_files_in_folder(
        &self,
        folder_path: &str,
        keep_metadata: bool,
    ) -> Result<Vec<FileRecord>> {
        let folder = self.locate(folder_path)?;
        let items = paging::get_all(&self.client, &endpoints::files_in(&folder), folder.as_str()).await?;

        let files = items
            .iter()
            .map(|item| normalize_file(item, BackendKind::Legacy, keep_metadata))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        if files.is_empty() {
            info!(folder = %folder, "No files were found in folder");
        }
        Ok(files)
    }

    async fn list_folders_in_folder(
        &self,
        folder_path: &str,
        keep_metadata: bool,
    ) -> Result<Vec<FolderRecord>> {
        let folder = self.locate(folder_path)?;
        let items =
            paging::get_all(&self.client, &endpoints::folders_in(&folder), folder.as_str()).await?;

        let folders = items
            .iter()
            .map(|item| normalize_folder(item, BackendKind::Legacy, keep_metadata))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(folders)
    }

    async fn download_file(&self, source_path: &str, destination_path: &Path) -> Result<()> {
        let source = self.locate(source_path)?;

        let request = self
            .client
            .request(Method::GET, &endpoints::content(&source))
            .await?;
        let response = self.client.send(request, source.as_str()).await?;
        let bytes = stream_to_file(response, destination_path).await?;

        info!(source = %source, destination = %destination_path.display(), bytes, "Downloaded file");
        Ok(())
    }

    async fn upload_file(
        &self,
        source_path: &Path,
        destination_folder_path: &str,
    ) -> Result<FileRecord> {
        let folder = self.locate(destination_folder_path)?;
        let source = UploadSource::inspect(source_path).await?;
        source.check_ceiling(BackendKind::Legacy, MAX_SIMPLE_UPLOAD)?;
        self.require_folder(&folder).await?;

        debug!(bytes = source.len, name = %source.name, folder = %folder, "Uploading file");
        let request = self
            .client
            .request(Method::POST, &endpoints::add_file(&folder, &source.name))
            .await?
            .header(CONTENT_LENGTH, source.len)
            .body(file_body(source_path).await?);
        let item: Map<String, Value> = self
            .client
            .send(request, folder.as_str())
            .await?
            .json()
            .await?;

        info!(source = %source_path.display(), destination = %folder, bytes = source.len, "Uploaded file");
        Ok(normalize_file(&item, BackendKind::Legacy, false)?)
    }

    async fn move_file_to_folder(
        &self,
        source_file_path: &str,
        destination_folder_path: &str,
        on_conflict: ConflictBehavior,
    ) -> Result<FileRecord> {
        let source = self.locate(source_file_path)?;
        let folder = self.locate(destination_folder_path)?;
        let target = folder.join(file_name(&source)?)?;

        self.require_folder(&folder).await?;
        self.relocate(&source, &target, on_conflict).await
    }

    async fn rename_file(
        &self,
        file_path: &str,
        new_name: &str,
        on_conflict: ConflictBehavior,
    ) -> Result<FileRecord> {
        spbridge_core::domain::validate_name(new_name)?;
        let source = self.locate(file_path)?;
        file_name(&source)?;
        let target = source.parent().unwrap_or_else(RemotePath::root).join(new_name)?;

        self.relocate(&source, &target, on_conflict).await
    }

    async fn recycle_file(&self, file_path: &str) -> Result<()> {
        let file = self.locate(file_path)?;
        file_name(&file)?;

        self.client
            .post_empty(&endpoints::recycle(&file), file.as_str())
            .await?;
        info!(file = %file, "Recycled file");
        Ok(())
    }

    async fn create_folder_if_not_exists(&self, folder_path: &str) -> Result<FolderRecord> {
        let target = self.locate(folder_path)?;
        let site = self.client.site();

        // Levels at and above the site always exist
        let mut current = site.path().clone();
        let mut native = None;
        for segment in site.site_relative(&target) {
            current = current.join(segment)?;
            let folder = match self.folder_state(&current).await? {
                Some(folder) => folder,
                None => self.add_folder(&current).await?,
            };
            native = Some(folder);
        }

        let folder = match native {
            Some(folder) => folder,
            None => self.require_folder(&target).await?,
        };
        Ok(normalize_folder(&folder, BackendKind::Legacy, false)?)
    }

    async fn folder_exists(&self, folder_path: &str) -> Result<bool> {
        let folder = self.locate(folder_path)?;
        Ok(self.folder_state(&folder).await?.is_some())
    }
}
