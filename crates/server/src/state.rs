//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ServerConfig;
use crate::identity::{IdentityClient, IdentityError, SignatureError, WebhookVerifier};
use crate::query::{QueryClient, QueryError};

/// Error creating application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("identity client: {0}")]
    Identity(#[from] IdentityError),
    #[error("webhook verifier: {0}")]
    Webhook(#[from] SignatureError),
    #[error("query client: {0}")]
    Query(#[from] QueryError),
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; provides access to the connection pool,
/// configuration, and the external-service clients.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: PgPool,
    identity: IdentityClient,
    webhook_verifier: WebhookVerifier,
    query: Option<QueryClient>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the identity or query client cannot be built or
    /// the webhook secret is malformed.
    pub fn new(config: ServerConfig, pool: PgPool) -> Result<Self, StateError> {
        let identity = IdentityClient::new(&config.identity)?;
        let webhook_verifier = WebhookVerifier::new(&config.identity.webhook_secret)?;
        let query = config
            .query_api_url
            .as_deref()
            .map(QueryClient::new)
            .transpose()?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                identity,
                webhook_verifier,
                query,
            }),
        })
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the identity provider client.
    #[must_use]
    pub fn identity(&self) -> &IdentityClient {
        &self.inner.identity
    }

    /// Get a reference to the webhook signature verifier.
    #[must_use]
    pub fn webhook_verifier(&self) -> &WebhookVerifier {
        &self.inner.webhook_verifier
    }

    /// Get the query service client, if one is configured.
    #[must_use]
    pub fn query(&self) -> Option<&QueryClient> {
        self.inner.query.as_ref()
    }
}
