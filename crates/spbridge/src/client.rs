//! SharePointClient - the entry point for file operations
//!
//! Builds one [`Credential`] and hands it to both backends, then puts a
//! [`Dispatcher`] in front of them. The credential's token cache is shared,
//! so Graph and SharePoint tokens are each requested once per expiry.

use std::sync::Arc;

use spbridge_auth::{get_credential, AuthConfig, Credential};
use spbridge_core::config::GraphConfig;
use spbridge_core::{BackendPolicy, ClientConfig, Dispatcher, Result, SiteUrl};
use spbridge_graph::{GraphClient, GraphFileBackend};
use spbridge_legacy::{LegacyClient, LegacyFileBackend};
use tracing::info;

/// File operations on one SharePoint site
#[derive(Debug, Clone)]
pub struct SharePointClient {
    site: SiteUrl,
    dispatcher: Arc<Dispatcher>,
}

impl SharePointClient {
    /// Client for `site_url` with default Graph settings
    ///
    /// # Errors
    /// [`spbridge_core::Error::Validation`] for a bad site URL,
    /// [`spbridge_core::Error::Configuration`] when `auth` cannot produce a
    /// credential.
    pub fn new(site_url: &str, auth: &AuthConfig, policy: BackendPolicy) -> Result<Self> {
        let site = SiteUrl::parse(site_url)?;
        let credential = get_credential(auth)?;
        Self::with_credential(site, credential, policy, &GraphConfig::default())
    }

    /// Client described by a [`ClientConfig`]
    ///
    /// Without an `auth` section the credential settings are read from the
    /// `AZURE_*` environment variables.
    ///
    /// # Errors
    /// [`spbridge_core::Error::Configuration`] for invalid settings.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let site = config.parsed_site_url()?;
        let auth = match &config.auth {
            Some(auth) => auth.clone(),
            None => AuthConfig::from_env()?,
        };
        let credential = get_credential(&auth)?;
        Self::with_credential(site, credential, config.backend, &config.graph)
    }

    /// Client around an existing credential
    ///
    /// # Errors
    /// [`spbridge_core::Error::Validation`] when no SharePoint scope can be
    /// derived from `site`.
    pub fn with_credential(
        site: SiteUrl,
        credential: Credential,
        policy: BackendPolicy,
        graph: &GraphConfig,
    ) -> Result<Self> {
        let graph_client = GraphClient::with_base_url(credential.clone(), graph.base_url.as_str())
            .with_page_size(graph.page_size);
        let graph_backend = GraphFileBackend::new(graph_client, site.clone())
            .with_list_options(graph.list_options.clone());
        let legacy_backend = LegacyFileBackend::new(LegacyClient::new(credential, site.clone())?);

        info!(site = %site, policy = %policy, "SharePoint client ready");
        let dispatcher = Dispatcher::new(policy, Arc::new(graph_backend), Arc::new(legacy_backend));
        Ok(Self {
            site,
            dispatcher: Arc::new(dispatcher),
        })
    }

    /// The file operations, routed according to the backend policy
    pub fn files(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Same as [`files`](Self::files), as a shareable handle
    pub fn shared_files(&self) -> Arc<Dispatcher> {
        Arc::clone(&self.dispatcher)
    }

    pub fn site(&self) -> &SiteUrl {
        &self.site
    }

    pub fn policy(&self) -> BackendPolicy {
        self.dispatcher.policy()
    }
}
