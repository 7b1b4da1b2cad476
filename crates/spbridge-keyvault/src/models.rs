//! Secret and certificate records
//!
//! Key Vault answers with "bundles" keyed by object id; these types keep the
//! name, version and attributes callers use and drop the rest. Secret values
//! stay in [`SecretString`] and never reach `Debug` output.

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::Value;
use spbridge_core::{Result, SchemaError};

use crate::client::parse_object_id;

/// Object attributes shared by secrets and certificates
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Attributes {
    pub enabled: Option<bool>,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub updated: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SecretBundle {
    pub id: String,
    #[serde(default)]
    pub value: Option<SecretString>,
    #[serde(default)]
    pub attributes: Attributes,
    pub content_type: Option<String>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DeletedBundle<T> {
    pub recovery_id: Option<String>,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub deleted_date: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub scheduled_purge_date: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub item: T,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CertificateBundle {
    pub id: String,
    pub x5t: Option<String>,
    pub cer: Option<String>,
    #[serde(default)]
    pub attributes: Attributes,
    pub policy: Option<Value>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

fn name_and_version(id: &str) -> Result<(String, Option<String>)> {
    parse_object_id(id).ok_or_else(|| {
        SchemaError::InvalidValue {
            field: "id",
            value: id.to_string(),
        }
        .into()
    })
}

/// Everything about a secret except its value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretProperties {
    pub name: String,
    pub version: Option<String>,
    pub enabled: Option<bool>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub content_type: Option<String>,
    pub tags: HashMap<String, String>,
}

impl SecretProperties {
    pub(crate) fn from_bundle(bundle: &SecretBundle) -> Result<Self> {
        let (name, version) = name_and_version(&bundle.id)?;
        Ok(Self {
            name,
            version,
            enabled: bundle.attributes.enabled,
            created_at: bundle.attributes.created,
            updated_at: bundle.attributes.updated,
            content_type: bundle.content_type.clone(),
            tags: bundle.tags.clone(),
        })
    }
}

/// A soft-deleted secret
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedSecret {
    pub properties: SecretProperties,
    /// `None` when the vault has soft-delete disabled
    pub recovery_id: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub scheduled_purge_at: Option<DateTime<Utc>>,
}

impl DeletedSecret {
    pub(crate) fn from_bundle(bundle: &DeletedBundle<SecretBundle>) -> Result<Self> {
        Ok(Self {
            properties: SecretProperties::from_bundle(&bundle.item)?,
            recovery_id: bundle.recovery_id.clone(),
            deleted_at: bundle.deleted_date,
            scheduled_purge_at: bundle.scheduled_purge_date,
        })
    }
}

/// Format of imported certificate material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CertificateContentType {
    /// PFX / PKCS#12, sent base64-encoded
    Pkcs12,
    /// PEM text holding the private key and the certificate chain
    Pem,
}

impl CertificateContentType {
    #[must_use]
    pub const fn mime_type(&self) -> &'static str {
        match self {
            CertificateContentType::Pkcs12 => "application/x-pkcs12",
            CertificateContentType::Pem => "application/x-pem-file",
        }
    }

    fn from_mime_type(mime: &str) -> Option<Self> {
        match mime {
            "application/x-pkcs12" => Some(CertificateContentType::Pkcs12),
            "application/x-pem-file" => Some(CertificateContentType::Pem),
            _ => None,
        }
    }
}

/// Latest version of a certificate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    pub name: String,
    pub version: Option<String>,
    /// Base64url SHA-1 thumbprint (`x5t`)
    pub thumbprint: Option<String>,
    /// DER-encoded public certificate
    pub cer: Vec<u8>,
    pub enabled: Option<bool>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub content_type: Option<CertificateContentType>,
    pub tags: HashMap<String, String>,
}

impl Certificate {
    pub(crate) fn from_bundle(bundle: &CertificateBundle) -> Result<Self> {
        let (name, version) = name_and_version(&bundle.id)?;
        let cer = match &bundle.cer {
            Some(encoded) => STANDARD.decode(encoded).map_err(|_| SchemaError::InvalidValue {
                field: "cer",
                value: encoded.clone(),
            })?,
            None => Vec::new(),
        };
        let content_type = bundle
            .policy
            .as_ref()
            .and_then(|p| p.pointer("/secret_props/contentType"))
            .and_then(Value::as_str)
            .and_then(CertificateContentType::from_mime_type);

        Ok(Self {
            name,
            version,
            thumbprint: bundle.x5t.clone(),
            cer,
            enabled: bundle.attributes.enabled,
            created_at: bundle.attributes.created,
            updated_at: bundle.attributes.updated,
            content_type,
            tags: bundle.tags.clone(),
        })
    }
}

/// A soft-deleted certificate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedCertificate {
    pub certificate: Certificate,
    pub recovery_id: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub scheduled_purge_at: Option<DateTime<Utc>>,
}

impl DeletedCertificate {
    pub(crate) fn from_bundle(bundle: &DeletedBundle<CertificateBundle>) -> Result<Self> {
        Ok(Self {
            certificate: Certificate::from_bundle(&bundle.item)?,
            recovery_id: bundle.recovery_id.clone(),
            deleted_at: bundle.deleted_date,
            scheduled_purge_at: bundle.scheduled_purge_date,
        })
    }
}

/// Settings for [`import_certificate`](crate::KeyVaultClient::import_certificate)
#[derive(Debug, Clone, Default)]
pub struct ImportCertificateOptions {
    /// Password protecting a PFX
    pub password: Option<SecretString>,
    pub enabled: Option<bool>,
    pub tags: HashMap<String, String>,
    /// Sent as the policy content type; PFX when unset
    pub content_type: Option<CertificateContentType>,
}
