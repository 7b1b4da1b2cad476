//! Canonical file and folder records
//!
//! Both backends produce these through the normalisation layer, so callers
//! see the same shape regardless of which API answered.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A remote file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub name: String,
    /// e.g. `/sites/foo/Shared Documents/a.txt`, when the backend reports it
    pub server_relative_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    /// Backend-native metadata; empty unless retention was requested
    #[serde(default)]
    pub extra: Map<String, Value>,
}

/// A remote folder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FolderRecord {
    pub name: String,
    pub server_relative_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    #[serde(default)]
    pub extra: Map<String, Value>,
    /// Number of direct children, when the backend reports it
    pub item_count: Option<u64>,
}
