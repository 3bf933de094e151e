//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side errors to
//! Sentry before responding to the client. All route handlers should return
//! `Result<T, AppError>`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::identity::{IdentityError, SignatureError};
use crate::provisioning::{ProfileErrors, ProvisionError};
use crate::query::QueryError;

/// Application-level error type for the provisioning API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed (includes duplicate-record conflicts).
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Identity provider operation failed.
    #[error("Identity provider error: {0}")]
    Provider(#[from] IdentityError),

    /// Webhook signature verification failed.
    #[error("Signature error: {0}")]
    Signature(#[from] SignatureError),

    /// Query service operation failed.
    #[error("Query service error: {0}")]
    Query(#[from] QueryError),

    /// Submitted profile failed validation.
    #[error("{0}")]
    Validation(#[from] ProfileErrors),

    /// The provider holds no verified email for this user.
    #[error("User email could not be found at the identity provider")]
    MissingEmail,

    /// Request is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ProvisionError> for AppError {
    fn from(e: ProvisionError) -> Self {
        match e {
            ProvisionError::Store(e) => Self::Database(e),
            ProvisionError::Provider(e) => Self::Provider(e),
        }
    }
}

impl AppError {
    const fn is_server_side(&self) -> bool {
        match self {
            Self::Database(RepositoryError::Conflict(_)) => false,
            Self::Database(_) | Self::Query(_) | Self::Internal(_) => true,
            Self::Provider(e) => !matches!(e, IdentityError::Unauthenticated),
            _ => false,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_side() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Database(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
            Self::Database(_) | Self::Query(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Provider(IdentityError::Unauthenticated) | Self::Unauthorized(_) => {
                StatusCode::UNAUTHORIZED
            }
            Self::Provider(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Signature(_) | Self::Validation(_) | Self::MissingEmail | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        };

        // Field-level messages go to the client; internal details do not.
        let body = match &self {
            Self::Validation(errors) => serde_json::json!({
                "error": "Invalid data",
                "details": errors,
            }),
            Self::Database(RepositoryError::Conflict(_)) => serde_json::json!({
                "error": "A profile already exists for this user",
            }),
            Self::Database(_) | Self::Internal(_) | Self::Query(_) => serde_json::json!({
                "error": "Internal server error",
            }),
            Self::Provider(IdentityError::Unauthenticated) | Self::Unauthorized(_) => {
                serde_json::json!({ "error": "Unauthorized" })
            }
            Self::Provider(_) => serde_json::json!({ "error": "Identity provider error" }),
            Self::Signature(_) => serde_json::json!({ "error": "Webhook verification failed" }),
            _ => serde_json::json!({ "error": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
