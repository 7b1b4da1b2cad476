//! Builds a [`Credential`] from an [`AuthConfig`]

use std::sync::Arc;

use tracing::info;

use crate::config::{AuthConfig, StrategyParams};
use crate::credential::{Credential, TokenCredential};
use crate::error::ConfigurationError;
use crate::strategies::{
    AzureCliCredential, ChainedCredential, ClientCertificateCredential, ClientSecretCredential,
    InteractiveBrowserCredential, ManagedIdentityCredential, UsernamePasswordCredential,
};

/// Creates the credential for `config.strategy()`
///
/// No network traffic happens here; the first token request does that.
///
/// # Errors
/// [`ConfigurationError`] when required parameters are missing or invalid.
pub fn get_credential(config: &AuthConfig) -> Result<Credential, ConfigurationError> {
    let params = config.resolve()?;
    let strategy = params.strategy();
    let authority = config.authority_host();

    let inner: Arc<dyn TokenCredential> = match params {
        StrategyParams::Default {
            tenant_id,
            client_id,
            client_secret,
            certificate_path,
            certificate_password,
        } => {
            let mut sources: Vec<(&'static str, Arc<dyn TokenCredential>)> = Vec::new();

            if let (Some(tenant), Some(client)) = (&tenant_id, &client_id) {
                if let Some(secret) = &client_secret {
                    sources.push((
                        "environment",
                        Arc::new(ClientSecretCredential::new(authority, tenant, client, secret)?),
                    ));
                } else if let Some(path) = &certificate_path {
                    sources.push((
                        "environment",
                        Arc::new(ClientCertificateCredential::new(
                            authority,
                            tenant,
                            client,
                            path,
                            certificate_password,
                        )?),
                    ));
                }
            }
            sources.push((
                "managed_identity",
                Arc::new(ManagedIdentityCredential::new(
                    config.managed_identity_endpoint().clone(),
                    client_id,
                )),
            ));
            sources.push(("cli", Arc::new(AzureCliCredential::new(tenant_id))));

            Arc::new(ChainedCredential::new(sources))
        }
        StrategyParams::Cli { tenant_id } => Arc::new(AzureCliCredential::new(tenant_id)),
        StrategyParams::ManagedIdentity { client_id } => Arc::new(ManagedIdentityCredential::new(
            config.managed_identity_endpoint().clone(),
            client_id,
        )),
        StrategyParams::ClientSecret {
            tenant_id,
            client_id,
            client_secret,
        } => Arc::new(ClientSecretCredential::new(
            authority,
            &tenant_id,
            &client_id,
            &client_secret,
        )?),
        StrategyParams::ClientCertificate {
            tenant_id,
            client_id,
            certificate_path,
            certificate_password,
        } => Arc::new(ClientCertificateCredential::new(
            authority,
            &tenant_id,
            &client_id,
            &certificate_path,
            certificate_password,
        )?),
        StrategyParams::InteractiveBrowser {
            tenant_id,
            client_id,
            redirect_uri,
        } => Arc::new(InteractiveBrowserCredential::new(
            authority,
            &tenant_id,
            &client_id,
            redirect_uri,
        )?),
        StrategyParams::UsernamePassword {
            tenant_id,
            client_id,
            username,
            password,
            client_secret,
        } => Arc::new(UsernamePasswordCredential::new(
            authority,
            &tenant_id,
            &client_id,
            &client_secret,
            &username,
            &password,
        )?),
    };

    info!(strategy = %strategy, "Created credential");
    Ok(Credential::new(strategy.as_str(), inner))
}
