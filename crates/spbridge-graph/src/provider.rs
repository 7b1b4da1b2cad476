//! GraphFileBackend - FileBackend implementation for Microsoft Graph
//!
//! Wraps the [`GraphClient`] and delegates to the drive, paging and upload
//! modules to fulfil the [`FileBackend`] port contract.
//!
//! ## Design Notes
//!
//! - Every path is resolved to a drive item first (see [`crate::drive`]);
//!   paths outside a document library are a backend incapability.
//! - Moves between libraries are a backend incapability.
//! - Move and rename conflicts use `@microsoft.graph.conflictBehavior`.
//! - Move, rename and recycle only act on items with a `file` facet; a folder
//!   at the path is `NotFound`, as on the legacy API.
//! - Record paths are rebuilt from `parentReference` under the library root.

use std::path::Path;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Map, Value};
use spbridge_core::normalize::{normalize_file, normalize_folder};
use spbridge_core::transfer::stream_to_file;
use spbridge_core::{
    BackendKind, ConflictBehavior, Error, FileBackend, FileRecord, FolderRecord, ListOptions,
    RemotePath, Result, SiteUrl, ValidationError,
};
use tracing::{debug, info};

use crate::client::GraphClient;
use crate::drive::{self, DriveItemRef};
use crate::{paging, upload};

const CONFLICT_BEHAVIOR: &str = "@microsoft.graph.conflictBehavior";

/// Microsoft Graph implementation of [`FileBackend`]
#[derive(Debug, Clone)]
pub struct GraphFileBackend {
    client: GraphClient,
    site: SiteUrl,
    list_options: ListOptions,
}

impl GraphFileBackend {
    pub fn new(client: GraphClient, site: SiteUrl) -> Self {
        Self {
            client,
            site,
            list_options: ListOptions::default(),
        }
    }

    /// Adds `$select`, `$expand`, `$filter` or `$orderby` to every listing
    #[must_use]
    pub fn with_list_options(mut self, list_options: ListOptions) -> Self {
        self.list_options = list_options;
        self
    }

    pub fn site(&self) -> &SiteUrl {
        &self.site
    }

    /// Validates `path` and resolves it to a drive item
    async fn locate(&self, path: &str) -> Result<(RemotePath, DriveItemRef)> {
        let remote = RemotePath::parse(path)?;
        let item = drive::resolve(&self.client, &self.site, &remote).await?;
        Ok((remote, item))
    }

    async fn get_item(&self, item: &DriveItemRef, resource: &str) -> Result<Map<String, Value>> {
        self.client.get_json(&item.item_path(), resource).await
    }

    /// The folder item, or `NotFound` when absent or not a folder
    async fn require_folder(
        &self,
        item: &DriveItemRef,
        resource: &str,
    ) -> Result<Map<String, Value>> {
        let native = self.get_item(item, resource).await?;
        if item.is_root() || native.contains_key("folder") {
            Ok(native)
        } else {
            Err(Error::NotFound(resource.to_string()))
        }
    }

    async fn children(
        &self,
        folder: &DriveItemRef,
        resource: &str,
    ) -> Result<Vec<Map<String, Value>>> {
        let path = format!("{}/children", folder.item_path());
        paging::get_all(&self.client, &path, &self.list_options, resource).await
    }

    /// The file item, or `NotFound` when absent or not a file
    async fn require_file(&self, path: &RemotePath, item: &DriveItemRef) -> Result<()> {
        if item.is_root() {
            return Err(Error::Validation(ValidationError::InvalidName {
                name: path.to_string(),
                reason: "path does not name a file",
            }));
        }
        let native = self.get_item(item, path.as_str()).await?;
        if native.contains_key("file") {
            Ok(())
        } else {
            Err(Error::NotFound(path.to_string()))
        }
    }

    /// `PATCH` a drive item with the given conflict behaviour
    async fn patch_item(
        &self,
        item: &DriveItemRef,
        body: Value,
        on_conflict: ConflictBehavior,
        resource: &str,
    ) -> Result<Map<String, Value>> {
        let request = self
            .client
            .request(Method::PATCH, &item.item_path())
            .await?
            .query(&[(CONFLICT_BEHAVIOR, on_conflict.as_str())])
            .json(&body);
        Ok(self.client.send(request, resource).await?.json().await?)
    }

    /// Creates `name` under `parent`; an existing folder of that name is
    /// returned instead
    async fn create_child_folder(
        &self,
        parent: &DriveItemRef,
        name: &str,
        resource: &str,
    ) -> Result<Map<String, Value>> {
        let path = format!("{}/children", parent.item_path());
        let body = json!({
            "name": name,
            "folder": {},
            "@microsoft.graph.conflictBehavior": "fail"
        });
        let request = self.client.request(Method::POST, &path).await?.json(&body);

        match self.client.send(request, resource).await {
            Ok(response) => Ok(response.json().await?),
            // Created concurrently
            Err(Error::Conflict(_)) => self.get_item(&parent.child(name), resource).await,
            Err(e) => Err(e),
        }
    }
}

fn file_record(
    scope: &DriveItemRef,
    native: &Map<String, Value>,
    keep_metadata: bool,
) -> Result<FileRecord> {
    let mut record = normalize_file(native, BackendKind::Graph, keep_metadata)?;
    if let Some(path) = scope.server_path_of(native) {
        record.server_relative_path = Some(path);
    }
    Ok(record)
}

fn folder_record(
    scope: &DriveItemRef,
    native: &Map<String, Value>,
    keep_metadata: bool,
) -> Result<FolderRecord> {
    let mut record = normalize_folder(native, BackendKind::Graph, keep_metadata)?;
    if let Some(path) = scope.server_path_of(native) {
        record.server_relative_path = Some(path);
    }
    Ok(record)
}

#[async_trait]
impl FileBackend for GraphFileBackend {
    async fn list_files_in_folder(
        &self,
        folder_path: &str,
        keep_metadata: bool,
    ) -> Result<Vec<FileRecord>> {
        let (remote, folder) = self.locate(folder_path).await?;
        let items = self.children(&folder, remote.as_str()).await?;

        let files = items
            .iter()
            .filter(|item| item.contains_key("file"))
            .map(|item| file_record(&folder, item, keep_metadata))
            .collect::<Result<Vec<_>>>()?;

        if files.is_empty() {
            info!(folder = %remote, "No files were found in folder");
        }
        Ok(files)
    }

    async fn list_folders_in_folder(
        &self,
        folder_path: &str,
        keep_metadata: bool,
    ) -> Result<Vec<FolderRecord>> {
        let (remote, folder) = self.locate(folder_path).await?;
        let items = self.children(&folder, remote.as_str()).await?;

        let folders = items
            .iter()
            .filter(|item| item.contains_key("folder"))
            .map(|item| folder_record(&folder, item, keep_metadata))
            .collect::<Result<Vec<_>>>()?;
        Ok(folders)
    }

    async fn download_file(&self, source_path: &str, destination_path: &Path) -> Result<()> {
        let (remote, item) = self.locate(source_path).await?;
        let path = format!("{}/content", item.item_path());

        // The content endpoint redirects to a pre-authenticated URL;
        // reqwest follows it.
        let request = self.client.request(Method::GET, &path).await?;
        let response = self.client.send(request, remote.as_str()).await?;
        let bytes = stream_to_file(response, destination_path).await?;

        info!(source = %remote, destination = %destination_path.display(), bytes, "Downloaded file");
        Ok(())
    }

    async fn upload_file(
        &self,
        source_path: &Path,
        destination_folder_path: &str,
    ) -> Result<FileRecord> {
        let remote = RemotePath::parse(destination_folder_path)?;
        let source = upload::prepare(source_path).await?;
        let (_, folder) = self.locate(remote.as_str()).await?;

        // A PUT by path would create missing parents; require the folder
        self.require_folder(&folder, remote.as_str()).await?;

        let item = upload::upload_small(&self.client, &folder, source_path, &source).await?;
        info!(source = %source_path.display(), destination = %remote, bytes = source.len, "Uploaded file");
        file_record(&folder, &item, false)
    }

    async fn move_file_to_folder(
        &self,
        source_file_path: &str,
        destination_folder_path: &str,
        on_conflict: ConflictBehavior,
    ) -> Result<FileRecord> {
        let (source_remote, source) = self.locate(source_file_path).await?;
        let (destination_remote, destination) = self.locate(destination_folder_path).await?;

        if source.drive_id != destination.drive_id {
            return Err(Error::incapable(
                BackendKind::Graph,
                "moving files between document libraries is not supported",
            ));
        }
        self.require_file(&source_remote, &source).await?;

        let folder = self
            .require_folder(&destination, destination_remote.as_str())
            .await?;
        let Some(folder_id) = folder.get("id").and_then(Value::as_str) else {
            return Err(spbridge_core::SchemaError::MissingField {
                backend: BackendKind::Graph,
                field: "id",
            }
            .into());
        };

        debug!(source = %source_remote, destination = %destination_remote, "Moving file");
        let body = json!({ "parentReference": { "id": folder_id } });
        let item = self
            .patch_item(&source, body, on_conflict, source_remote.as_str())
            .await?;
        file_record(&source, &item, false)
    }

    async fn rename_file(
        &self,
        file_path: &str,
        new_name: &str,
        on_conflict: ConflictBehavior,
    ) -> Result<FileRecord> {
        spbridge_core::domain::validate_name(new_name)?;
        let (remote, item) = self.locate(file_path).await?;
        self.require_file(&remote, &item).await?;

        debug!(file = %remote, new_name, "Renaming file");
        let body = json!({ "name": new_name });
        let renamed = self
            .patch_item(&item, body, on_conflict, remote.as_str())
            .await?;
        file_record(&item, &renamed, false)
    }

    async fn recycle_file(&self, file_path: &str) -> Result<()> {
        let (remote, item) = self.locate(file_path).await?;
        self.require_file(&remote, &item).await?;

        // Deleting a drive item moves it to the site recycle bin
        let request = self.client.request(Method::DELETE, &item.item_path()).await?;
        self.client.send(request, remote.as_str()).await?;
        info!(file = %remote, "Recycled file");
        Ok(())
    }

    async fn create_folder_if_not_exists(&self, folder_path: &str) -> Result<FolderRecord> {
        let (remote, target) = self.locate(folder_path).await?;

        let mut current = target.root();
        let mut native = if target.is_root() {
            Some(self.get_item(&current, remote.as_str()).await?)
        } else {
            None
        };

        for segment in &target.segments {
            let next = current.child(segment);
            let item = match self.get_item(&next, remote.as_str()).await {
                Ok(item) => item,
                Err(e) if e.is_not_found() => {
                    info!(folder = %remote, segment = %segment, "Creating folder");
                    self.create_child_folder(&current, segment, remote.as_str())
                        .await?
                }
                Err(e) => return Err(e),
            };
            if !item.contains_key("folder") {
                return Err(Error::Conflict(format!(
                    "{remote}: a file named {segment:?} is in the way"
                )));
            }
            current = next;
            native = Some(item);
        }

        match native {
            Some(item) => folder_record(&target, &item, false),
            None => Err(Error::NotFound(remote.to_string())),
        }
    }

    async fn folder_exists(&self, folder_path: &str) -> Result<bool> {
        let (remote, item) = self.locate(folder_path).await?;
        match self.require_folder(&item, remote.as_str()).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }
}
