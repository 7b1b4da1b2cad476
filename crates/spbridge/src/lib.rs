//! spbridge - SharePoint document library access
//!
//! One client, two APIs: operations go to Microsoft Graph and, under the
//! `auto` policy, fall back to the site's SharePoint REST endpoint when
//! Graph cannot handle the request.
//!
//! ```rust,no_run
//! use spbridge::{AuthConfig, BackendPolicy, FileBackend, SharePointClient};
//!
//! # async fn example() -> spbridge::Result<()> {
//! let auth = AuthConfig::from_env()?;
//! let client = SharePointClient::new(
//!     "https://contoso.sharepoint.com/sites/finance",
//!     &auth,
//!     BackendPolicy::Auto,
//! )?;
//! for file in client.files().list_files_in_folder("/Shared Documents/Reports", false).await? {
//!     println!("{}", file.name);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod logging;

pub use client::SharePointClient;

pub use spbridge_auth::{
    get_credential, spo_scope_from_url, AuthConfig, AuthenticationError, ConfigurationError,
    Credential, LegacyAuthArgs, Strategy, GRAPH_DEFAULT_SCOPE,
};
pub use spbridge_core::{
    BackendKind, BackendPolicy, ClientConfig, ConflictBehavior, Dispatcher, Error, FileBackend,
    FileRecord, FolderRecord, Result,
};
