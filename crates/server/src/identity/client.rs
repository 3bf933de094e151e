//! Identity provider backend API client.
//!
//! Thin REST client over the provider's server-side API: session
//! resolution, user lookup, and metadata patching. All calls are
//! authenticated with the provider secret key and carry a short timeout;
//! the orchestrator treats a timeout as provider unavailability.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;

use hemolink_core::{Email, ExternalUserId};

use crate::config::IdentityConfig;

/// Per-call timeout for provider requests.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur when interacting with the identity provider.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// HTTP transport failed (includes timeouts).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The session credential did not resolve to a signed-in user.
    #[error("session could not be resolved")]
    Unauthenticated,

    /// The provider has no user for this external id.
    #[error("no provider user for external id: {0}")]
    UserNotFound(ExternalUserId),

    /// The provider returned an unexpected error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse a provider response.
    #[error("parse error: {0}")]
    Parse(String),
}

/// A user as the identity provider sees them.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityUser {
    /// Stable external identifier.
    pub id: ExternalUserId,
    /// Verified email addresses, primary first.
    #[serde(default)]
    pub email_addresses: Vec<EmailAddressEntry>,
    /// Given name captured at signup, if any.
    pub first_name: Option<String>,
    /// Family name captured at signup, if any.
    pub last_name: Option<String>,
    /// The provider-owned metadata bag.
    #[serde(default)]
    pub public_metadata: serde_json::Map<String, serde_json::Value>,
}

/// One entry of a provider user's email address set.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailAddressEntry {
    pub email_address: String,
}

impl IdentityUser {
    /// The user's primary email address, parsed.
    ///
    /// Returns `None` when the provider holds no (parseable) address —
    /// the `MissingEmail` condition.
    #[must_use]
    pub fn primary_email(&self) -> Option<Email> {
        self.email_addresses
            .first()
            .and_then(|entry| Email::parse(&entry.email_address).ok())
    }
}

/// Shape of a successful session resolution response.
#[derive(Debug, Deserialize)]
struct SessionResolution {
    user_id: ExternalUserId,
}

/// Identity provider backend API client.
#[derive(Clone)]
pub struct IdentityClient {
    client: reqwest::Client,
    base_url: String,
}

impl IdentityClient {
    /// Create a new identity provider client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build or the secret key is
    /// not a valid header value.
    pub fn new(config: &IdentityConfig) -> Result<Self, IdentityError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.secret_key.expose_secret());
        let mut auth_header = HeaderValue::from_str(&auth_value)
            .map_err(|e| IdentityError::Parse(format!("invalid secret key format: {e}")))?;
        auth_header.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_header);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Resolve a bearer session token to the external user it belongs to.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::Unauthenticated` if the token does not
    /// resolve to a signed-in user, `IdentityError::Http` on transport
    /// failure.
    pub async fn resolve_session(
        &self,
        session_token: &str,
    ) -> Result<ExternalUserId, IdentityError> {
        let url = format!("{}/v1/sessions/verify", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "token": session_token }))
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::NOT_FOUND => {
                Err(IdentityError::Unauthenticated)
            }
            status if status.is_success() => {
                let resolution: SessionResolution = response
                    .json()
                    .await
                    .map_err(|e| IdentityError::Parse(e.to_string()))?;
                Ok(resolution.user_id)
            }
            status => Err(IdentityError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            }),
        }
    }

    /// Fetch a user's contact record and metadata.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::UserNotFound` if the provider has no such
    /// user, `IdentityError::Http` on transport failure.
    pub async fn get_user(
        &self,
        external_id: &ExternalUserId,
    ) -> Result<IdentityUser, IdentityError> {
        let url = format!("{}/v1/users/{}", self.base_url, external_id);

        let response = self.client.get(&url).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(IdentityError::UserNotFound(external_id.clone())),
            status if status.is_success() => response
                .json()
                .await
                .map_err(|e| IdentityError::Parse(e.to_string())),
            status => Err(IdentityError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            }),
        }
    }

    /// Merge keys into a user's public metadata bag.
    ///
    /// Provider semantics are last-write-wins per key, so patching the same
    /// payload twice is harmless; the orchestrator relies on that for its
    /// repair pass.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::UserNotFound` if the provider has no such
    /// user, `IdentityError::Http` on transport failure.
    pub async fn update_public_metadata(
        &self,
        external_id: &ExternalUserId,
        metadata: serde_json::Value,
    ) -> Result<(), IdentityError> {
        let url = format!("{}/v1/users/{}/metadata", self.base_url, external_id);

        let response = self
            .client
            .patch(&url)
            .json(&serde_json::json!({ "public_metadata": metadata }))
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(IdentityError::UserNotFound(external_id.clone())),
            status if status.is_success() => Ok(()),
            status => Err(IdentityError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn test_config(base_url: &str) -> IdentityConfig {
        IdentityConfig {
            api_url: base_url.to_owned(),
            secret_key: SecretString::from("sk_test_wG5kQ9pXvR2mJ8tZ1cB4nH7d"),
            webhook_secret: SecretString::from("whsec_dGVzdC1rZXktZm9yLXVuaXQtdGVzdHM="),
        }
    }

    #[tokio::test]
    async fn test_resolve_session_success() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/sessions/verify"))
            .and(header(
                "authorization",
                "Bearer sk_test_wG5kQ9pXvR2mJ8tZ1cB4nH7d",
            ))
            .and(body_json(serde_json::json!({ "token": "sess_abc" })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "user_id": "user_123" })),
            )
            .mount(&server)
            .await;

        let client = IdentityClient::new(&test_config(&server.uri())).unwrap();
        let user_id = client.resolve_session("sess_abc").await.unwrap();
        assert_eq!(user_id, ExternalUserId::from("user_123"));
    }

    #[tokio::test]
    async fn test_resolve_session_unauthenticated() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/sessions/verify"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = IdentityClient::new(&test_config(&server.uri())).unwrap();
        let result = client.resolve_session("sess_expired").await;
        assert!(matches!(result, Err(IdentityError::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_get_user_primary_email() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/users/user_123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "user_123",
                "email_addresses": [
                    { "email_address": "ann@x.com" },
                    { "email_address": "ann@backup.com" }
                ],
                "first_name": "Ann",
                "last_name": "Lee",
                "public_metadata": {}
            })))
            .mount(&server)
            .await;

        let client = IdentityClient::new(&test_config(&server.uri())).unwrap();
        let user = client
            .get_user(&ExternalUserId::from("user_123"))
            .await
            .unwrap();
        assert_eq!(user.primary_email().unwrap().as_str(), "ann@x.com");
    }

    #[tokio::test]
    async fn test_get_user_empty_email_set() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/users/user_456"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "user_456",
                "email_addresses": [],
                "first_name": null,
                "last_name": null
            })))
            .mount(&server)
            .await;

        let client = IdentityClient::new(&test_config(&server.uri())).unwrap();
        let user = client
            .get_user(&ExternalUserId::from("user_456"))
            .await
            .unwrap();
        assert!(user.primary_email().is_none());
    }

    #[tokio::test]
    async fn test_update_metadata_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/v1/users/user_gone/metadata"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = IdentityClient::new(&test_config(&server.uri())).unwrap();
        let result = client
            .update_public_metadata(
                &ExternalUserId::from("user_gone"),
                serde_json::json!({ "db_id": 1 }),
            )
            .await;
        assert!(matches!(result, Err(IdentityError::UserNotFound(_))));
    }

    #[tokio::test]
    async fn test_update_metadata_wraps_payload() {
        let server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/v1/users/user_123/metadata"))
            .and(body_json(serde_json::json!({
                "public_metadata": { "db_id": 42, "role": "donor" }
            })))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = IdentityClient::new(&test_config(&server.uri())).unwrap();
        client
            .update_public_metadata(
                &ExternalUserId::from("user_123"),
                serde_json::json!({ "db_id": 42, "role": "donor" }),
            )
            .await
            .unwrap();
    }
}
