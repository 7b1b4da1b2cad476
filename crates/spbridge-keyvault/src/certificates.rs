//! Certificate operations
//!
//! Same shape as the secret operations, under `/certificates` and
//! `/deletedcertificates`. Imports post the certificate material to
//! `/certificates/{name}/import`: PFX bytes base64-encoded, PEM as text.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Method;
use secrecy::ExposeSecret;
use serde_json::{json, Value};
use spbridge_core::{Error, Result};
use tracing::info;

use crate::client::{validate_object_name, KeyVaultClient};
use crate::models::{
    Certificate, CertificateBundle, CertificateContentType, DeletedBundle, DeletedCertificate,
    ImportCertificateOptions,
};
use crate::secrets::names_of;

impl KeyVaultClient {
    /// Latest version of `name`, with its public part
    ///
    /// # Errors
    /// [`Error::NotFound`] when there is no such certificate.
    pub async fn get_certificate(&self, name: &str) -> Result<Certificate> {
        validate_object_name(name)?;
        let bundle: CertificateBundle = self.get_json(&format!("/certificates/{name}"), name).await?;
        Certificate::from_bundle(&bundle)
    }

    /// Names of every certificate in the vault
    ///
    /// # Errors
    /// Request errors.
    pub async fn list_certificate_names(&self) -> Result<Vec<String>> {
        let items = self.get_all("/certificates", None, "certificates").await?;
        Ok(names_of(&items))
    }

    /// Imports PFX or PEM material as `name`
    ///
    /// # Errors
    /// [`Error::Io`] when PEM material is not UTF-8, otherwise request
    /// errors.
    pub async fn import_certificate(
        &self,
        name: &str,
        material: &[u8],
        options: &ImportCertificateOptions,
    ) -> Result<Certificate> {
        validate_object_name(name)?;
        let body = import_body(material, options)?;
        let request = self
            .request(Method::POST, &format!("/certificates/{name}/import"))
            .await?
            .json(&body);
        let bundle: CertificateBundle = self.send(request, name).await?.json().await?;

        let certificate = Certificate::from_bundle(&bundle)?;
        info!(certificate = name, version = ?certificate.version, "Imported certificate");
        Ok(certificate)
    }

    /// Reads `path` and imports it; a `.pem` file is sent as PEM
    ///
    /// # Errors
    /// [`Error::NotFound`] when `path` does not exist, otherwise as
    /// [`import_certificate`](Self::import_certificate).
    pub async fn import_certificate_from_file(
        &self,
        name: &str,
        path: &Path,
        options: ImportCertificateOptions,
    ) -> Result<Certificate> {
        let material = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::NotFound(path.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let is_pem = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pem"));
        let options = if is_pem {
            ImportCertificateOptions {
                content_type: Some(CertificateContentType::Pem),
                ..options
            }
        } else {
            options
        };

        self.import_certificate(name, &material, &options).await
    }

    /// Deletes `name` and waits until the deletion is visible
    ///
    /// # Errors
    /// [`Error::NotFound`] when there is no such certificate.
    pub async fn delete_certificate(&self, name: &str) -> Result<DeletedCertificate> {
        validate_object_name(name)?;
        let request = self
            .request(Method::DELETE, &format!("/certificates/{name}"))
            .await?;
        let bundle: DeletedBundle<CertificateBundle> =
            self.send(request, name).await?.json().await?;
        let deleted = DeletedCertificate::from_bundle(&bundle)?;

        if deleted.recovery_id.is_some() {
            self.wait_for(&format!("/deletedcertificates/{name}"), name).await?;
        }
        info!(certificate = name, "Deleted certificate");
        Ok(deleted)
    }

    /// Names of soft-deleted certificates
    ///
    /// # Errors
    /// Request errors.
    pub async fn list_deleted_certificate_names(
        &self,
        max_page_size: Option<u32>,
    ) -> Result<Vec<String>> {
        let items = self
            .get_all("/deletedcertificates", max_page_size, "deletedcertificates")
            .await?;
        Ok(names_of(&items))
    }

    /// Restores a soft-deleted certificate and waits until it can be read
    ///
    /// # Errors
    /// [`Error::NotFound`] when `name` is not in the deleted state.
    pub async fn recover_certificate(&self, name: &str) -> Result<Certificate> {
        validate_object_name(name)?;
        let request = self
            .request(Method::POST, &format!("/deletedcertificates/{name}/recover"))
            .await?;
        let bundle: CertificateBundle = self.send(request, name).await?.json().await?;
        let certificate = Certificate::from_bundle(&bundle)?;

        self.wait_for(&format!("/certificates/{name}"), name).await?;
        info!(certificate = name, "Recovered certificate");
        Ok(certificate)
    }
}

fn import_body(material: &[u8], options: &ImportCertificateOptions) -> Result<Value> {
    let value = match options.content_type {
        Some(CertificateContentType::Pem) => std::str::from_utf8(material)
            .map_err(|_| {
                std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "PEM certificate material is not UTF-8",
                )
            })?
            .to_string(),
        _ => STANDARD.encode(material),
    };

    let mut body = json!({ "value": value });
    if let Some(password) = &options.password {
        body["pwd"] = json!(password.expose_secret());
    }
    if let Some(content_type) = options.content_type {
        body["policy"] = json!({ "secret_props": { "contentType": content_type.mime_type() } });
    }
    if let Some(enabled) = options.enabled {
        body["attributes"] = json!({ "enabled": enabled });
    }
    if !options.tags.is_empty() {
        body["tags"] = json!(options.tags);
    }
    Ok(body)
}
