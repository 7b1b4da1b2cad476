//! Scope helpers
//!
//! Derive the token audience for each backend from a site URL. These are
//! plain string transformations and never touch the network.

use url::Url;

use crate::error::ScopeError;

/// Scope for Microsoft Graph requests
pub const GRAPH_DEFAULT_SCOPE: &str = "https://graph.microsoft.com/.default";

/// Scope for Azure Key Vault data-plane requests
pub const KEY_VAULT_SCOPE: &str = "https://vault.azure.net/.default";

/// Returns the `scheme://host[:port]` part of an absolute URL
///
/// # Errors
/// [`ScopeError::InvalidUrl`] when `site_url` has no scheme or no host.
pub fn authority_from_url(site_url: &str) -> Result<String, ScopeError> {
    let invalid = || ScopeError::InvalidUrl(site_url.to_string());

    let parsed = Url::parse(site_url).map_err(|_| invalid())?;
    let host = parsed.host_str().filter(|h| !h.is_empty()).ok_or_else(invalid)?;

    Ok(match parsed.port() {
        Some(port) => format!("{}://{}:{}", parsed.scheme(), host, port),
        None => format!("{}://{}", parsed.scheme(), host),
    })
}

/// Returns the SharePoint resource scope (`{authority}/.default`) for a site
///
/// # Errors
/// Same as [`authority_from_url`].
pub fn spo_scope_from_url(site_url: &str) -> Result<String, ScopeError> {
    Ok(format!("{}/.default", authority_from_url(site_url)?))
}

/// Strips the `/.default` suffix, giving the v1 resource identifier
/// used by endpoints that take `resource=` instead of `scope=`.
pub(crate) fn resource_from_scope(scope: &str) -> &str {
    scope.strip_suffix("/.default").unwrap_or(scope)
}
