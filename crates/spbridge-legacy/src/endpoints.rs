//! `_api/web` resource paths
//!
//! Files and folders are addressed by server-relative path through the
//! `...ByServerRelativePath(decodedurl='...')` functions, which accept
//! names the older `...ByServerRelativeUrl` functions reject. Arguments are
//! OData string literals: single quotes are doubled, then the whole value is
//! percent-encoded.

use spbridge_core::{ConflictBehavior, RemotePath};

/// OData string literal contents for `value`
pub fn literal(value: &str) -> String {
    urlencoding::encode(&value.replace('\'', "''")).into_owned()
}

/// `/_api/web/GetFolderByServerRelativePath(decodedurl='...')`
pub fn folder(path: &RemotePath) -> String {
    format!(
        "/_api/web/GetFolderByServerRelativePath(decodedurl='{}')",
        literal(path.as_str())
    )
}

/// `/_api/web/GetFileByServerRelativePath(decodedurl='...')`
pub fn file(path: &RemotePath) -> String {
    format!(
        "/_api/web/GetFileByServerRelativePath(decodedurl='{}')",
        literal(path.as_str())
    )
}

pub fn files_in(folder_path: &RemotePath) -> String {
    format!("{}/Files", folder(folder_path))
}

pub fn folders_in(folder_path: &RemotePath) -> String {
    format!("{}/Folders", folder(folder_path))
}

/// Raw file content
pub fn content(path: &RemotePath) -> String {
    format!("{}/$value", file(path))
}

/// Upload into `folder_path`, replacing an existing file of the same name
pub fn add_file(folder_path: &RemotePath, name: &str) -> String {
    format!(
        "{}/Files/add(url='{}',overwrite=true)",
        folder(folder_path),
        literal(name)
    )
}

/// Move or rename `source` to the full target path
///
/// `flags=1` overwrites an existing target; `flags=0` fails on it.
pub fn move_to(source: &RemotePath, target: &RemotePath, on_conflict: ConflictBehavior) -> String {
    let flags = match on_conflict {
        ConflictBehavior::Replace => 1,
        ConflictBehavior::Fail => 0,
    };
    format!(
        "{}/MoveTo(newurl='{}',flags={flags})",
        file(source),
        literal(target.as_str())
    )
}

/// Send the file to the recycle bin
pub fn recycle(path: &RemotePath) -> String {
    format!("{}/recycle()", file(path))
}

/// Create one folder at `path`; its parent must already exist
pub fn add_folder(path: &RemotePath) -> String {
    format!(
        "/_api/web/Folders/AddUsingPath(decodedurl='{}')",
        literal(path.as_str())
    )
}
