//! Backend-native metadata to canonical records
//!
//! | Field | Graph | Legacy |
//! |-------|-------|--------|
//! | name | `name` | `Name` |
//! | server-relative path | path of a direct `webUrl`, percent-decoded | `ServerRelativeUrl` |
//! | created | `createdDateTime` | `TimeCreated` |
//! | modified | `lastModifiedDateTime` | `TimeLastModified` |
//! | item count | `folder.childCount` | `ItemCount` |
//!
//! Office documents get a `webUrl` pointing at the web viewer
//! (`/_layouts/15/Doc.aspx?sourcedoc=...`); those give no path here.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use crate::domain::{BackendKind, FileRecord, FolderRecord, SchemaError};

struct Keys {
    name: &'static str,
    created: &'static str,
    modified: &'static str,
}

static GRAPH_KEYS: Keys = Keys {
    name: "name",
    created: "createdDateTime",
    modified: "lastModifiedDateTime",
};

static LEGACY_KEYS: Keys = Keys {
    name: "Name",
    created: "TimeCreated",
    modified: "TimeLastModified",
};

fn keys(backend: BackendKind) -> &'static Keys {
    match backend {
        BackendKind::Graph => &GRAPH_KEYS,
        BackendKind::Legacy => &LEGACY_KEYS,
    }
}

/// Builds a [`FileRecord`] from one native item
///
/// # Errors
/// [`SchemaError`] when the name or a timestamp is missing or unparsable.
pub fn normalize_file(
    native: &Map<String, Value>,
    backend: BackendKind,
    keep_metadata: bool,
) -> Result<FileRecord, SchemaError> {
    let keys = keys(backend);

    Ok(FileRecord {
        name: required_str(native, backend, keys.name)?.to_string(),
        server_relative_path: server_relative_path(native, backend),
        created_at: timestamp(native, backend, keys.created)?,
        modified_at: timestamp(native, backend, keys.modified)?,
        extra: extra(native, keep_metadata),
    })
}

/// Builds a [`FolderRecord`] from one native item
///
/// # Errors
/// Same as [`normalize_file`].
pub fn normalize_folder(
    native: &Map<String, Value>,
    backend: BackendKind,
    keep_metadata: bool,
) -> Result<FolderRecord, SchemaError> {
    let file = normalize_file(native, backend, keep_metadata)?;
    let item_count = match backend {
        BackendKind::Graph => native
            .get("folder")
            .and_then(|f| f.get("childCount"))
            .and_then(Value::as_u64),
        BackendKind::Legacy => native.get("ItemCount").and_then(Value::as_u64),
    };

    Ok(FolderRecord {
        name: file.name,
        server_relative_path: file.server_relative_path,
        created_at: file.created_at,
        modified_at: file.modified_at,
        extra: file.extra,
        item_count,
    })
}

fn required_str<'a>(
    native: &'a Map<String, Value>,
    backend: BackendKind,
    field: &'static str,
) -> Result<&'a str, SchemaError> {
    native
        .get(field)
        .and_then(Value::as_str)
        .ok_or(SchemaError::MissingField { backend, field })
}

fn timestamp(
    native: &Map<String, Value>,
    backend: BackendKind,
    field: &'static str,
) -> Result<DateTime<Utc>, SchemaError> {
    let raw = required_str(native, backend, field)?;
    parse_timestamp(raw).ok_or_else(|| SchemaError::InvalidValue {
        field,
        value: raw.to_string(),
    })
}

/// RFC 3339, or a zone-less ISO 8601 timestamp taken as UTC
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

fn server_relative_path(native: &Map<String, Value>, backend: BackendKind) -> Option<String> {
    match backend {
        BackendKind::Graph => {
            let web_url = native.get("webUrl").and_then(Value::as_str)?;
            let url = url::Url::parse(web_url).ok()?;
            let viewer = url.query().is_some()
                || url
                    .path_segments()
                    .is_some_and(|mut segments| segments.any(|s| s.eq_ignore_ascii_case("_layouts")));
            if viewer {
                return None;
            }
            urlencoding::decode(url.path()).ok().map(|p| p.into_owned())
        }
        BackendKind::Legacy => native
            .get("ServerRelativeUrl")
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}

fn extra(native: &Map<String, Value>, keep_metadata: bool) -> Map<String, Value> {
    if keep_metadata {
        native.clone()
    } else {
        Map::new()
    }
}
