//! Secret operations against a mocked Key Vault

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use spbridge_core::{Error, ValidationError};
use wiremock::matchers::{body_json, header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, ResponseTemplate};

use crate::common::{self, TOKEN};

#[tokio::test]
async fn test_get_secret_value() {
    let (server, client) = common::setup_vault_mock().await;

    Mock::given(method("GET"))
        .and(path("/secrets/db-password"))
        .and(query_param("api-version", "7.4"))
        .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(common::secret_bundle(&server, "db-password", Some("hunter2"))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let value = client.get_secret_value("db-password").await.unwrap();
    assert_eq!(value.expose_secret(), "hunter2");
}

#[tokio::test]
async fn test_missing_secret_is_not_found() {
    let (server, client) = common::setup_vault_mock().await;

    Mock::given(method("GET"))
        .and(path("/secrets/gone"))
        .respond_with(common::vault_error(404, "SecretNotFound", "A secret with (name/id) gone was not found in this key vault."))
        .mount(&server)
        .await;

    let err = client.get_secret_value("gone").await.unwrap_err();
    assert!(err.is_not_found(), "{err:?}");
}

#[tokio::test]
async fn test_forbidden_is_permission_denied() {
    let (server, client) = common::setup_vault_mock().await;

    Mock::given(method("GET"))
        .and(path("/secrets/db-password"))
        .respond_with(common::vault_error(403, "Forbidden", "The user does not have secrets get permission"))
        .mount(&server)
        .await;

    let err = client.get_secret_value("db-password").await.unwrap_err();
    assert!(matches!(err, Error::PermissionDenied(_)), "{err:?}");
}

#[tokio::test]
async fn test_invalid_name_is_rejected_before_any_request() {
    let (server, client) = common::setup_vault_mock().await;

    let results = vec![
        client.get_secret_value("../keys/x").await.map(|_| ()),
        client
            .set_secret_value("db_password", &SecretString::new("x".to_string()))
            .await
            .map(|_| ()),
        client.delete_secret("").await.map(|_| ()),
        client.recover_secret("a b").await.map(|_| ()),
    ];

    for result in results {
        assert!(matches!(
            result,
            Err(Error::Validation(ValidationError::InvalidName { .. }))
        ));
    }
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_secret_names_follows_next_link() {
    let (server, client) = common::setup_vault_mock().await;
    let uri = server.uri();

    Mock::given(method("GET"))
        .and(path("/secrets"))
        .and(query_param_is_missing("$skiptoken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [
                { "id": format!("{uri}/secrets/alpha"), "attributes": { "enabled": true } },
                { "id": format!("{uri}/secrets/beta"), "attributes": { "enabled": true } }
            ],
            "nextLink": format!("{uri}/secrets?api-version=7.4&$skiptoken=p2")
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/secrets"))
        .and(query_param("$skiptoken", "p2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{ "id": format!("{uri}/secrets/gamma") }],
            "nextLink": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let names = client.list_secret_names().await.unwrap();
    assert_eq!(names, vec!["alpha", "beta", "gamma"]);
}

#[tokio::test]
async fn test_set_secret_value() {
    let (server, client) = common::setup_vault_mock().await;

    Mock::given(method("PUT"))
        .and(path("/secrets/db-password"))
        .and(body_json(json!({ "value": "hunter2" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(common::secret_bundle(&server, "db-password", Some("hunter2"))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let properties = client
        .set_secret_value("db-password", &SecretString::new("hunter2".to_string()))
        .await
        .unwrap();

    assert_eq!(properties.name, "db-password");
    assert_eq!(properties.version.as_deref(), Some("v1"));
    assert!(!format!("{properties:?}").contains("hunter2"));
}

#[tokio::test]
async fn test_delete_waits_until_deleted_secret_is_visible() {
    let (server, client) = common::setup_vault_mock().await;
    let uri = server.uri();

    let mut deleted = common::secret_bundle(&server, "db-password", None);
    deleted["recoveryId"] = json!(format!("{uri}/deletedsecrets/db-password"));
    deleted["deletedDate"] = json!(1_714_000_000);
    deleted["scheduledPurgeDate"] = json!(1_721_776_000);

    Mock::given(method("DELETE"))
        .and(path("/secrets/db-password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(deleted.clone()))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/deletedsecrets/db-password"))
        .respond_with(common::vault_error(404, "SecretNotFound", "Deleted Secret not found"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/deletedsecrets/db-password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(deleted))
        .expect(1)
        .mount(&server)
        .await;

    let result = client.delete_secret("db-password").await.unwrap();

    assert_eq!(result.properties.name, "db-password");
    assert!(result.recovery_id.is_some());
    assert_eq!(
        result.deleted_at.unwrap().timestamp(),
        1_714_000_000
    );
}

#[tokio::test]
async fn test_delete_without_soft_delete_does_not_poll() {
    let (server, client) = common::setup_vault_mock().await;

    Mock::given(method("DELETE"))
        .and(path("/secrets/db-password"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(common::secret_bundle(&server, "db-password", None)),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = client.delete_secret("db-password").await.unwrap();
    assert!(result.recovery_id.is_none());
}

#[tokio::test]
async fn test_list_deleted_secret_names_sends_page_size() {
    let (server, client) = common::setup_vault_mock().await;
    let uri = server.uri();

    Mock::given(method("GET"))
        .and(path("/deletedsecrets"))
        .and(query_param("maxresults", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{
                "recoveryId": format!("{uri}/deletedsecrets/old-token"),
                "id": format!("{uri}/secrets/old-token")
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let names = client.list_deleted_secret_names(Some(5)).await.unwrap();
    assert_eq!(names, vec!["old-token"]);
}

#[tokio::test]
async fn test_recover_waits_until_secret_is_readable() {
    let (server, client) = common::setup_vault_mock().await;

    Mock::given(method("POST"))
        .and(path("/deletedsecrets/db-password/recover"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(common::secret_bundle(&server, "db-password", None)),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/secrets/db-password"))
        .respond_with(common::vault_error(404, "SecretNotFound", "not yet"))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/secrets/db-password"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(common::secret_bundle(&server, "db-password", Some("hunter2"))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let properties = client.recover_secret("db-password").await.unwrap();
    assert_eq!(properties.name, "db-password");
}
