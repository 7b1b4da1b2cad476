//! Secret operations
//!
//! | Operation | Request |
//! |-----------|---------|
//! | get value | `GET /secrets/{name}` |
//! | list names | `GET /secrets` |
//! | set value | `PUT /secrets/{name}` |
//! | delete | `DELETE /secrets/{name}`, then poll `/deletedsecrets/{name}` |
//! | list deleted names | `GET /deletedsecrets` |
//! | recover | `POST /deletedsecrets/{name}/recover`, then poll `/secrets/{name}` |

use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use spbridge_core::{Result, SchemaError};
use tracing::info;

use crate::client::{parse_object_id, validate_object_name, KeyVaultClient};
use crate::models::{DeletedBundle, DeletedSecret, SecretBundle, SecretProperties};

impl KeyVaultClient {
    /// Value of the latest version of `name`
    ///
    /// # Errors
    /// [`Error::NotFound`](spbridge_core::Error::NotFound) when there is no
    /// such secret.
    pub async fn get_secret_value(&self, name: &str) -> Result<SecretString> {
        validate_object_name(name)?;
        let bundle: SecretBundle = self.get_json(&format!("/secrets/{name}"), name).await?;
        bundle.value.ok_or_else(|| {
            SchemaError::InvalidValue {
                field: "value",
                value: String::new(),
            }
            .into()
        })
    }

    /// Names of every secret in the vault, in service order
    ///
    /// # Errors
    /// Request errors; the first failing page aborts the listing.
    pub async fn list_secret_names(&self) -> Result<Vec<String>> {
        let items = self.get_all("/secrets", None, "secrets").await?;
        Ok(names_of(&items))
    }

    /// Creates `name`, or adds a new version when it already exists
    ///
    /// # Errors
    /// Request errors.
    pub async fn set_secret_value(
        &self,
        name: &str,
        value: &SecretString,
    ) -> Result<SecretProperties> {
        validate_object_name(name)?;
        let body = json!({ "value": value.expose_secret() });
        let request = self
            .request(Method::PUT, &format!("/secrets/{name}"))
            .await?
            .json(&body);
        let bundle: SecretBundle = self.send(request, name).await?.json().await?;

        let properties = SecretProperties::from_bundle(&bundle)?;
        info!(secret = name, version = ?properties.version, "Stored secret");
        Ok(properties)
    }

    /// Deletes `name` and waits until the deletion is visible
    ///
    /// # Errors
    /// [`Error::NotFound`](spbridge_core::Error::NotFound) when there is no
    /// such secret.
    pub async fn delete_secret(&self, name: &str) -> Result<DeletedSecret> {
        validate_object_name(name)?;
        let request = self
            .request(Method::DELETE, &format!("/secrets/{name}"))
            .await?;
        let bundle: DeletedBundle<SecretBundle> = self.send(request, name).await?.json().await?;
        let deleted = DeletedSecret::from_bundle(&bundle)?;

        if deleted.recovery_id.is_some() {
            self.wait_for(&format!("/deletedsecrets/{name}"), name).await?;
        }
        info!(secret = name, recoverable = deleted.recovery_id.is_some(), "Deleted secret");
        Ok(deleted)
    }

    /// Names of soft-deleted secrets
    ///
    /// `max_page_size` limits each page; every page is still fetched.
    ///
    /// # Errors
    /// Request errors.
    pub async fn list_deleted_secret_names(&self, max_page_size: Option<u32>) -> Result<Vec<String>> {
        let items = self
            .get_all("/deletedsecrets", max_page_size, "deletedsecrets")
            .await?;
        Ok(names_of(&items))
    }

    /// Restores a soft-deleted secret and waits until it can be read
    ///
    /// # Errors
    /// [`Error::NotFound`](spbridge_core::Error::NotFound) when `name` is not
    /// in the deleted state.
    pub async fn recover_secret(&self, name: &str) -> Result<SecretProperties> {
        validate_object_name(name)?;
        let request = self
            .request(Method::POST, &format!("/deletedsecrets/{name}/recover"))
            .await?;
        let bundle: SecretBundle = self.send(request, name).await?.json().await?;
        let properties = SecretProperties::from_bundle(&bundle)?;

        self.wait_for(&format!("/secrets/{name}"), name).await?;
        info!(secret = name, "Recovered secret");
        Ok(properties)
    }
}

/// Object names from listing items, whose `id` has no version
pub(crate) fn names_of(items: &[serde_json::Map<String, serde_json::Value>]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| item.get("id").and_then(serde_json::Value::as_str))
        .filter_map(parse_object_id)
        .map(|(name, _)| name)
        .collect()
}
