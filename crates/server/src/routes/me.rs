//! Read-back route: the caller's own User Record.
//!
//! Dashboards normally read through the query service directly; this route
//! is the server-side equivalent for clients that only hold a session. It
//! follows the metadata link (`db_id`) rather than a store lookup by
//! external id, so an unlinked (degraded) record correctly reads as "not
//! yet provisioned".

use axum::{Json, extract::State, http::HeaderMap, response::IntoResponse};
use tracing::instrument;

use hemolink_core::UserId;

use crate::db::UserRepository;
use crate::error::{AppError, Result};
use crate::identity::METADATA_DB_ID;
use crate::query::QueriedUser;
use crate::routes::bearer_token;
use crate::state::AppState;

/// Fetch the caller's User Record.
///
/// Responses: `200` with the record, `401` when the session does not
/// resolve, `404` when provisioning has not completed (no metadata link).
#[instrument(skip_all)]
pub async fn my_record(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse> {
    let token = bearer_token(&headers)?;

    let external_id = state.identity().resolve_session(token).await?;
    let user = state.identity().get_user(&external_id).await?;

    // Only the metadata flag counts as "provisioned".
    let db_id = user
        .public_metadata
        .get(METADATA_DB_ID)
        .and_then(serde_json::Value::as_i64)
        .and_then(|id| i32::try_from(id).ok())
        .map(UserId::new)
        .ok_or_else(|| AppError::NotFound("profile not yet provisioned".into()))?;

    // Prefer the query service (it applies the caller's claim); fall back
    // to a direct store read when none is configured.
    if let Some(query) = state.query() {
        let record = query
            .user_by_id(db_id, token)
            .await?
            .ok_or_else(|| AppError::NotFound("user record not found".into()))?;
        return Ok(Json(record).into_response());
    }

    let record = UserRepository::new(state.pool())
        .find_by_id(db_id)
        .await?
        .ok_or_else(|| AppError::NotFound("user record not found".into()))?;

    Ok(Json(QueriedUser {
        id: record.id,
        email: record.email.into_inner(),
        name: record.name,
        role: record.role.as_str().to_owned(),
        blood_group: record.blood_group.map(|g| g.as_str().to_owned()),
        last_donation_date: record.last_donation_date,
    })
    .into_response())
}
