//! Remote path rules
//!
//! Every remote path passes through [`RemotePath::parse`] before any request
//! is built. `#` and `%` are refused outright: the two backends disagree on
//! how (and whether) to escape them, so a path containing either cannot be
//! addressed reliably.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use url::Url;

use super::errors::ValidationError;

/// Characters refused anywhere in a remote path or name
pub const DISALLOWED_CHARACTERS: [char; 2] = ['#', '%'];

fn check_disallowed(value: &str, path: &str) -> Result<(), ValidationError> {
    match value.chars().find(|c| DISALLOWED_CHARACTERS.contains(c)) {
        Some(character) => Err(ValidationError::DisallowedCharacter {
            character,
            path: path.to_string(),
        }),
        None => Ok(()),
    }
}

/// Checks a single file or folder name
///
/// # Errors
/// [`ValidationError`] when the name is empty, is `.` or `..`, contains a
/// path separator or a disallowed character.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    let invalid = |reason| ValidationError::InvalidName {
        name: name.to_string(),
        reason,
    };

    if name.trim().is_empty() {
        return Err(invalid("name is empty"));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(invalid("name must not contain path separators"));
    }
    if name == "." || name == ".." {
        return Err(invalid("name must not be a relative path component"));
    }
    check_disallowed(name, name)
}

// ============================================================================
// RemotePath
// ============================================================================

/// A validated, absolute remote path such as `/sites/foo/Shared Documents/a.txt`
///
/// Duplicate and trailing slashes are collapsed; `.` segments are dropped.
/// The path may be server-relative or site-relative; [`SiteUrl::resolve`]
/// turns the latter into the former.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemotePath(String);

impl RemotePath {
    /// Validates and normalises `path`
    ///
    /// # Errors
    /// [`ValidationError::EmptyPath`], [`ValidationError::DisallowedCharacter`]
    /// or [`ValidationError::ParentTraversal`].
    pub fn parse(path: &str) -> Result<Self, ValidationError> {
        if path.trim().is_empty() {
            return Err(ValidationError::EmptyPath);
        }
        check_disallowed(path, path)?;

        let mut segments = Vec::new();
        for segment in path.split('/') {
            match segment {
                "" | "." => {}
                ".." => return Err(ValidationError::ParentTraversal(path.to_string())),
                other => segments.push(other),
            }
        }

        Ok(Self::from_segments(&segments))
    }

    fn from_segments(segments: &[&str]) -> Self {
        Self(format!("/{}", segments.join("/")))
    }

    /// The root path `/`
    #[must_use]
    pub fn root() -> Self {
        Self("/".to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Non-empty segments, in order
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Last segment, `None` for the root
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.segments().last()
    }

    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        let segments: Vec<&str> = self.segments().collect();
        Some(Self::from_segments(&segments[..segments.len() - 1]))
    }

    /// Appends one validated name
    ///
    /// # Errors
    /// Same as [`validate_name`].
    pub fn join(&self, name: &str) -> Result<Self, ValidationError> {
        validate_name(name)?;
        Ok(if self.is_root() {
            Self(format!("/{name}"))
        } else {
            Self(format!("{}/{name}", self.0))
        })
    }

    /// Segment-wise prefix test (`/a/b` starts with `/a`, not with `/a/b2`)
    #[must_use]
    pub fn starts_with(&self, prefix: &RemotePath) -> bool {
        let mut own = self.segments();
        prefix.segments().all(|p| own.next() == Some(p))
    }

    /// Segments after `prefix`, or `None` if `prefix` does not match
    #[must_use]
    pub fn strip_prefix(&self, prefix: &RemotePath) -> Option<Vec<&str>> {
        if !self.starts_with(prefix) {
            return None;
        }
        Some(self.segments().skip(prefix.segments().count()).collect())
    }
}

impl Display for RemotePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RemotePath {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for RemotePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// SiteUrl
// ============================================================================

/// A SharePoint site URL split into origin and server-relative site path
///
/// `contoso.sharepoint.com/sites/finance` (no scheme) is accepted and
/// treated as `https://`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteUrl {
    url: Url,
    path: RemotePath,
}

impl SiteUrl {
    /// # Errors
    /// [`ValidationError::InvalidSiteUrl`] when the URL has no host.
    pub fn parse(site_url: &str) -> Result<Self, ValidationError> {
        let trimmed = site_url.trim().trim_end_matches('/');
        let with_scheme = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("https://{trimmed}")
        };

        let invalid = || ValidationError::InvalidSiteUrl(site_url.to_string());
        let url = Url::parse(&with_scheme).map_err(|_| invalid())?;
        if url.host_str().map_or(true, str::is_empty) {
            return Err(invalid());
        }

        let decoded = urlencoding::decode(url.path()).map_err(|_| invalid())?;
        let path = if decoded.trim_matches('/').is_empty() {
            RemotePath::root()
        } else {
            RemotePath::parse(&decoded).map_err(|_| invalid())?
        };

        Ok(Self { url, path })
    }

    /// Full URL as given (scheme added when missing, no trailing slash)
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.url.as_str().trim_end_matches('/')
    }

    /// `scheme://host[:port]`
    #[must_use]
    pub fn origin(&self) -> String {
        self.url.origin().ascii_serialization()
    }

    #[must_use]
    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// Server-relative site path, `/` for the root site
    #[must_use]
    pub fn path(&self) -> &RemotePath {
        &self.path
    }

    /// Makes a site-relative path server-relative
    ///
    /// Paths already under the site path are returned unchanged.
    #[must_use]
    pub fn resolve(&self, path: &RemotePath) -> RemotePath {
        if self.path.is_root() || path.starts_with(&self.path) {
            return path.clone();
        }
        let mut segments: Vec<&str> = self.path.segments().collect();
        segments.extend(path.segments());
        RemotePath::from_segments(&segments)
    }

    /// Segments of a server-relative `path` below the site path
    #[must_use]
    pub fn site_relative<'a>(&self, path: &'a RemotePath) -> Vec<&'a str> {
        path.strip_prefix(&self.path)
            .unwrap_or_else(|| path.segments().collect())
    }
}

impl Display for SiteUrl {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
