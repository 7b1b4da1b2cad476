//! spbridge Key Vault - secrets and certificates in Azure Key Vault
//!
//! A small data-plane client that reuses the spbridge credential stack:
//! - Secrets: get, list, set, delete, list deleted, recover
//! - Certificates: get, list, import (PFX or PEM), delete, list deleted, recover
//! - Credential selection by run mode (Azure CLI, managed identity, default chain)
//!
//! ## Modules
//!
//! - [`client`] - Authenticated HTTP client, paging and polling
//! - [`models`] - Secret and certificate records
//! - [`secrets`] - Secret operations
//! - [`certificates`] - Certificate operations

pub mod certificates;
pub mod client;
pub mod models;
pub mod secrets;

pub use client::{credential_for_run, KeyVaultClient, API_VERSION};
pub use models::{
    Certificate, CertificateContentType, DeletedCertificate, DeletedSecret,
    ImportCertificateOptions, SecretProperties,
};
