//! HTTP route handlers for the provisioning API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                  - Liveness check
//! GET  /health/ready            - Readiness check (DB probe)
//!
//! # Provisioning
//! POST /api/profile             - Direct profile creation (bearer session)
//! POST /api/webhooks/identity   - Provider event notifications (signed)
//!
//! # Read-back
//! GET  /api/me/record           - The caller's User Record (bearer session)
//! ```

pub mod me;
pub mod profile;
pub mod webhooks;

use axum::{
    Router,
    http::HeaderMap,
    routing::{get, post},
};

use crate::error::AppError;
use crate::state::AppState;

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/profile", post(profile::create_profile))
        .route("/api/webhooks/identity", post(webhooks::handle_identity_event))
        .route("/api/me/record", get(me::my_record))
}

/// Extract the bearer session token from the Authorization header.
///
/// # Errors
///
/// Returns `AppError::Unauthorized` if the header is missing or not a
/// bearer credential.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized("missing bearer credential".into()))
}
