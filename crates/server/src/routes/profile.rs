//! Direct profile-creation route.
//!
//! The client calls this after signup with a bearer session credential and
//! the completed profile form. The handler verifies the session with the
//! identity provider, validates the submission, and drives the provisioning
//! orchestrator.

use axum::{Json, extract::State, http::HeaderMap, response::IntoResponse};
use serde::Serialize;
use tracing::instrument;

use hemolink_core::UserId;

use crate::db::RepositoryError;
use crate::error::{AppError, Result};
use crate::provisioning::{ProfileSubmission, ProvisionOutcome, Provisioner};
use crate::routes::bearer_token;
use crate::state::AppState;

/// Success body of the direct provisioning call.
#[derive(Debug, Serialize)]
pub struct CreateProfileResponse {
    pub user_id: UserId,
    /// False when the record was written but the provider metadata patch
    /// failed; a later request repairs the link.
    pub metadata_synced: bool,
}

/// Create the caller's User Record.
///
/// Responses: `200` with the new internal id, `400` on validation failure
/// or missing email, `401` when the session does not resolve, `409` when a
/// record already exists, `500` on store/provider errors.
#[instrument(skip_all)]
pub async fn create_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(submission): Json<ProfileSubmission>,
) -> Result<impl IntoResponse> {
    let token = bearer_token(&headers)?;

    // Verifier: session -> external id, then the verified contact record.
    let external_id = state.identity().resolve_session(token).await?;
    let user = state.identity().get_user(&external_id).await?;
    let email = user.primary_email().ok_or(AppError::MissingEmail)?;

    let profile = submission.validate()?;

    let provisioner = Provisioner::new(state.pool(), state.identity());
    match provisioner.provision(&external_id, &email, &profile).await? {
        ProvisionOutcome::Created(record) => Ok(Json(CreateProfileResponse {
            user_id: record.id,
            metadata_synced: true,
        })),
        ProvisionOutcome::Degraded(record) => {
            // Partial success: the insert stands, the link does not.
            Ok(Json(CreateProfileResponse {
                user_id: record.id,
                metadata_synced: false,
            }))
        }
        ProvisionOutcome::AlreadyProvisioned(record) => {
            Err(AppError::Database(RepositoryError::Conflict(format!(
                "user record {} already exists",
                record.id
            ))))
        }
    }
}
