//! App registration with a certificate
//!
//! Uses the client credentials grant with a signed JWT client assertion
//! instead of a shared secret. The PEM file must contain the certificate
//! and an unencrypted RSA private key (PKCS#1 or PKCS#8). The file is read
//! on the first token request, not at construction.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use oauth2::basic::BasicClient;
use oauth2::{AuthType, ClientId, Scope};
use secrecy::SecretString;
use serde::Serialize;
use sha1::{Digest, Sha1};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use super::{access_token_from, http_client, map_token_error, token_endpoint, token_url, TokenClient};
use crate::credential::{AccessToken, TokenCredential};
use crate::error::{AuthenticationError, ConfigurationError};

const KIND: &str = "client_certificate";

const ASSERTION_TYPE: &str = "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

/// Client assertions are valid for this long
const ASSERTION_LIFETIME_MINUTES: i64 = 10;

/// Signing material extracted from the PEM file
#[derive(Clone)]
struct CertificateMaterial {
    key: EncodingKey,
    /// base64url(SHA-1(certificate DER)), sent as the `x5t` header
    thumbprint: String,
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    aud: &'a str,
    iss: &'a str,
    sub: &'a str,
    jti: String,
    nbf: i64,
    iat: i64,
    exp: i64,
}

pub struct ClientCertificateCredential {
    client: TokenClient,
    http: reqwest::Client,
    client_id: String,
    audience: String,
    certificate_path: PathBuf,
    certificate_password: Option<SecretString>,
    material: OnceCell<CertificateMaterial>,
}

impl ClientCertificateCredential {
    pub fn new(
        authority: &str,
        tenant_id: &str,
        client_id: &str,
        certificate_path: &Path,
        certificate_password: Option<SecretString>,
    ) -> Result<Self, ConfigurationError> {
        let client = BasicClient::new(ClientId::new(client_id.to_string()))
            .set_auth_type(AuthType::RequestBody)
            .set_token_uri(token_url(authority, tenant_id)?);

        Ok(Self {
            client,
            http: http_client(),
            client_id: client_id.to_string(),
            audience: token_endpoint(authority, tenant_id),
            certificate_path: certificate_path.to_path_buf(),
            certificate_password,
            material: OnceCell::new(),
        })
    }

    async fn material(&self) -> Result<&CertificateMaterial, AuthenticationError> {
        self.material
            .get_or_try_init(|| async {
                let pem = tokio::fs::read_to_string(&self.certificate_path)
                    .await
                    .map_err(|e| {
                        AuthenticationError::material(
                            KIND,
                            format!("{}: {e}", self.certificate_path.display()),
                        )
                    })?;
                if self.certificate_password.is_some() {
                    warn!("certificate_password is ignored; only unencrypted keys are supported");
                }
                let material = parse_pem(&pem)?;
                debug!(thumbprint = %material.thumbprint, "Loaded client certificate");
                Ok(material)
            })
            .await
    }

    fn client_assertion(&self, material: &CertificateMaterial) -> Result<String, AuthenticationError> {
        let now = Utc::now();
        let claims = AssertionClaims {
            aud: &self.audience,
            iss: &self.client_id,
            sub: &self.client_id,
            jti: uuid::Uuid::new_v4().to_string(),
            nbf: now.timestamp(),
            iat: now.timestamp(),
            exp: (now + Duration::minutes(ASSERTION_LIFETIME_MINUTES)).timestamp(),
        };

        let mut header = Header::new(Algorithm::RS256);
        header.x5t = Some(material.thumbprint.clone());

        jsonwebtoken::encode(&header, &claims, &material.key)
            .map_err(|e| AuthenticationError::material(KIND, format!("cannot sign assertion: {e}")))
    }
}

#[async_trait]
impl TokenCredential for ClientCertificateCredential {
    async fn get_token(&self, scope: &str) -> Result<AccessToken, AuthenticationError> {
        let material = self.material().await?;
        let assertion = self.client_assertion(material)?;

        let response = self
            .client
            .exchange_client_credentials()
            .add_scope(Scope::new(scope.to_string()))
            .add_extra_param("client_assertion_type", ASSERTION_TYPE)
            .add_extra_param("client_assertion", assertion)
            .request_async(&self.http)
            .await
            .map_err(|e| map_token_error(KIND, e))?;

        Ok(access_token_from(&response))
    }
}

/// A `-----BEGIN {label}-----` block
struct PemBlock<'a> {
    label: &'a str,
    text: &'a str,
    body: String,
}

fn pem_blocks(pem: &str) -> Vec<PemBlock<'_>> {
    let mut blocks = Vec::new();
    let mut rest = pem;

    while let Some(start) = rest.find("-----BEGIN ") {
        let after = &rest[start + "-----BEGIN ".len()..];
        let Some(label_end) = after.find("-----") else {
            break;
        };
        let label = &after[..label_end];
        let end_marker = format!("-----END {label}-----");
        let Some(end) = rest[start..].find(&end_marker) else {
            break;
        };
        let block_end = start + end + end_marker.len();
        let body_start = start + "-----BEGIN ".len() + label_end + "-----".len();

        blocks.push(PemBlock {
            label,
            text: &rest[start..block_end],
            body: rest[body_start..start + end]
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect(),
        });
        rest = &rest[block_end..];
    }

    blocks
}

fn parse_pem(pem: &str) -> Result<CertificateMaterial, AuthenticationError> {
    let blocks = pem_blocks(pem);

    let certificate = blocks
        .iter()
        .find(|b| b.label == "CERTIFICATE")
        .ok_or_else(|| AuthenticationError::material(KIND, "no CERTIFICATE block found"))?;
    let der = STANDARD
        .decode(&certificate.body)
        .map_err(|e| AuthenticationError::material(KIND, format!("invalid certificate encoding: {e}")))?;
    let thumbprint = URL_SAFE_NO_PAD.encode(Sha1::digest(&der));

    if blocks.iter().any(|b| b.label == "ENCRYPTED PRIVATE KEY") {
        return Err(AuthenticationError::material(
            KIND,
            "encrypted private keys are not supported; export the key unencrypted",
        ));
    }
    let key_block = blocks
        .iter()
        .find(|b| b.label == "PRIVATE KEY" || b.label == "RSA PRIVATE KEY")
        .ok_or_else(|| AuthenticationError::material(KIND, "no PRIVATE KEY block found"))?;
    let key = EncodingKey::from_rsa_pem(key_block.text.as_bytes())
        .map_err(|e| AuthenticationError::material(KIND, format!("invalid private key: {e}")))?;

    Ok(CertificateMaterial { key, thumbprint })
}
