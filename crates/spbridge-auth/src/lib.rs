//! spbridge-auth - Credential configuration and acquisition
//!
//! Turns a validated [`AuthConfig`] into a [`Credential`] that hands out
//! bearer tokens for Microsoft Graph and SharePoint.
//!
//! ## Modules
//!
//! - [`config`] - Strategy selection and validated settings
//! - [`credential`] - Token trait and the caching credential handle
//! - [`factory`] - Maps a config to its credential
//! - [`strategies`] - One implementation per strategy
//! - [`scopes`] - Token audiences derived from a site URL
//! - [`error`] - Configuration and authentication errors

pub mod config;
pub mod credential;
pub mod error;
pub mod factory;
pub mod scopes;
pub mod strategies;

pub use config::{AuthConfig, AuthConfigBuilder, LegacyAuthArgs, Strategy, StrategyParams};
pub use credential::{AccessToken, Credential, TokenCredential};
pub use error::{AuthenticationError, ConfigurationError, ScopeError};
pub use factory::get_credential;
pub use scopes::{authority_from_url, spo_scope_from_url, GRAPH_DEFAULT_SCOPE, KEY_VAULT_SCOPE};
