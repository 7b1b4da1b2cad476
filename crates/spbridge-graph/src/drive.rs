//! Site and document library resolution
//!
//! Graph addresses files by drive, not by server-relative URL, so every
//! operation first maps a path like `/sites/finance/Shared Documents/a/b.txt`
//! to a drive plus a drive-relative path:
//!
//! 1. **Site id**: `GET /sites/{host}:{site-path}`
//! 2. **Drives**: `GET /sites/{site-id}/drives`
//! 3. **Library**: the first path segment below the site, matched against each
//!    drive's `name` or the last segment of its `webUrl`
//!    (`Documents` vs `Shared Documents`)
//!
//! Nothing is cached; each call resolves again.
//!
//! The library's server-relative root travels with every [`DriveItemRef`] so
//! item paths can be rebuilt from `parentReference.path`, which stays correct
//! when `webUrl` points at the Office web viewer.

use serde::Deserialize;
use serde_json::{Map, Value};
use spbridge_core::{BackendKind, Error, RemotePath, Result, SiteUrl};
use tracing::debug;

use crate::client::GraphClient;

#[derive(Debug, Deserialize)]
struct SiteResponse {
    id: String,
}

/// One entry of `GET /sites/{id}/drives`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Drive {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub web_url: String,
}

#[derive(Debug, Deserialize)]
struct DrivesResponse {
    value: Vec<Drive>,
}

/// A drive item addressed by path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveItemRef {
    pub drive_id: String,
    /// Segments below the library root; empty for the root itself
    pub segments: Vec<String>,
    /// Server-relative path of the library root, e.g.
    /// `/sites/finance/Shared Documents`; empty when unknown
    pub library_path: String,
}

impl DriveItemRef {
    pub fn new(drive_id: impl Into<String>, segments: Vec<String>) -> Self {
        Self {
            drive_id: drive_id.into(),
            segments,
            library_path: String::new(),
        }
    }

    #[must_use]
    pub fn with_library_path(mut self, library_path: impl Into<String>) -> Self {
        self.library_path = library_path.into().trim_end_matches('/').to_string();
        self
    }

    /// Server-relative path of a native item in this item's library
    ///
    /// Built from `parentReference.path` (`/drives/{id}/root:/a/b`) and
    /// `name`. `None` when the library root or either key is unknown.
    pub fn server_path_of(&self, native: &Map<String, Value>) -> Option<String> {
        if self.library_path.is_empty() {
            return None;
        }
        let name = native.get("name").and_then(Value::as_str)?;
        let parent = native
            .get("parentReference")
            .and_then(|p| p.get("path"))
            .and_then(Value::as_str)?;
        let (_, below_root) = parent.split_once("root:")?;
        let below_root = urlencoding::decode(below_root).ok()?;
        let below_root = below_root.trim_matches('/');

        Some(if below_root.is_empty() {
            format!("{}/{name}", self.library_path)
        } else {
            format!("{}/{below_root}/{name}", self.library_path)
        })
    }

    /// `/drives/{id}/root` or `/drives/{id}/root:/a/b:`
    ///
    /// Suffixes like `/children` or `/content` are appended directly.
    pub fn item_path(&self) -> String {
        if self.segments.is_empty() {
            return format!("/drives/{}/root", self.drive_id);
        }
        let encoded: Vec<String> = self
            .segments
            .iter()
            .map(|s| urlencoding::encode(s).into_owned())
            .collect();
        format!("/drives/{}/root:/{}:", self.drive_id, encoded.join("/"))
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn child(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Self {
            segments,
            ..self.clone()
        }
    }

    /// The library root of the same drive
    pub fn root(&self) -> Self {
        Self {
            segments: Vec::new(),
            ..self.clone()
        }
    }
}

/// `/sites/{host}` for a root site, `/sites/{host}:/sites/foo` otherwise
pub fn site_lookup_path(site: &SiteUrl) -> String {
    if site.path().is_root() {
        return format!("/sites/{}", site.host());
    }
    let encoded: Vec<String> = site
        .path()
        .segments()
        .map(|s| urlencoding::encode(s).into_owned())
        .collect();
    format!("/sites/{}:/{}", site.host(), encoded.join("/"))
}

/// Picks the drive whose name or URL segment equals `library`
pub fn match_drive<'a>(drives: &'a [Drive], library: &str) -> Option<&'a Drive> {
    drives.iter().find(|drive| {
        drive.name.eq_ignore_ascii_case(library) || url_library(&drive.web_url)
            .is_some_and(|segment| segment.eq_ignore_ascii_case(library))
    })
}

/// Last path segment of a drive's `webUrl`, percent-decoded
fn url_library(web_url: &str) -> Option<String> {
    let url = url::Url::parse(web_url).ok()?;
    let last = url.path_segments()?.filter(|s| !s.is_empty()).last()?;
    urlencoding::decode(last).ok().map(|s| s.into_owned())
}

/// Server-relative root of a library, from its `webUrl` or else from the
/// site path and the library segment the caller used
fn library_path(drive: &Drive, site: &SiteUrl, library: &str) -> String {
    let from_url = url::Url::parse(&drive.web_url)
        .ok()
        .and_then(|url| urlencoding::decode(url.path()).ok().map(|p| p.into_owned()))
        .filter(|p| !p.trim_matches('/').is_empty());

    from_url.unwrap_or_else(|| {
        format!("{}/{library}", site.path().as_str().trim_end_matches('/'))
    })
}

/// Resolves `path` (server- or site-relative) to a drive item
///
/// # Errors
/// [`Error::BackendIncapable`] when the path does not start with a document
/// library of the site; request errors otherwise.
pub async fn resolve(client: &GraphClient, site: &SiteUrl, path: &RemotePath) -> Result<DriveItemRef> {
    let absolute = site.resolve(path);
    let mut segments = site
        .site_relative(&absolute)
        .into_iter()
        .map(str::to_string);

    let Some(library) = segments.next() else {
        return Err(Error::incapable(
            BackendKind::Graph,
            format!("{absolute} is the site itself, not a document library path"),
        ));
    };

    let site_resource = site.as_str();
    let site_info: SiteResponse = client
        .get_json(&site_lookup_path(site), site_resource)
        .await?;
    let drives: DrivesResponse = client
        .get_json(&format!("/sites/{}/drives", site_info.id), site_resource)
        .await?;

    let Some(drive) = match_drive(&drives.value, &library) else {
        return Err(Error::incapable(
            BackendKind::Graph,
            format!("no document library named {library:?} in {site_resource}"),
        ));
    };

    debug!(library = %library, drive_id = %drive.id, "Resolved document library");
    Ok(DriveItemRef::new(drive.id.clone(), segments.collect())
        .with_library_path(library_path(drive, site, &library)))
}
