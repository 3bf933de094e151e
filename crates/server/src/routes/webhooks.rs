//! Identity provider webhook route.
//!
//! The provider pushes signed event notifications; `user.created` drives
//! provisioning with whatever profile attributes its signup form captured.
//! A non-200 response makes the provider redeliver, so every failure mode
//! here must be safe under redelivery - the store's uniqueness constraint
//! and the metadata repair pass make it so.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use tracing::instrument;

use hemolink_core::{Email, ExternalUserId};

use crate::error::{AppError, Result};
use crate::identity::events::{SignupMetadata, USER_CREATED, WebhookEvent};
use crate::provisioning::{ProvisionOutcome, Provisioner, validate_signup_metadata};
use crate::state::AppState;

/// Required transport headers of a signed event.
const HEADER_ID: &str = "svix-id";
const HEADER_TIMESTAMP: &str = "svix-timestamp";
const HEADER_SIGNATURE: &str = "svix-signature";

fn required_header<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::BadRequest(format!("missing {name} header")))
}

/// Handle a provider event notification.
///
/// Responses: `200` on success, no-op event types, and already-provisioned
/// redeliveries; `400` on missing headers, bad signature, or invalid
/// metadata; `500` on store errors or a failed metadata patch (so the
/// provider redelivers and the repair pass relinks).
#[instrument(skip_all)]
pub async fn handle_identity_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse> {
    let message_id = required_header(&headers, HEADER_ID)?;
    let timestamp = required_header(&headers, HEADER_TIMESTAMP)?;
    let signature = required_header(&headers, HEADER_SIGNATURE)?;

    state
        .webhook_verifier()
        .verify(message_id, timestamp, signature, &body)?;

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("invalid event payload: {e}")))?;

    if event.event_type != USER_CREATED {
        tracing::debug!(event_type = %event.event_type, "ignoring event");
        return Ok(StatusCode::OK);
    }

    let external_id = ExternalUserId::from(event.data.id.as_str());
    let email = event
        .data
        .primary_email()
        .and_then(|s| Email::parse(s).ok())
        .ok_or(AppError::MissingEmail)?;

    let metadata = SignupMetadata::from_event(&event.data)
        .map_err(|e| AppError::BadRequest(format!("invalid signup metadata: {e}")))?;
    let profile = validate_signup_metadata(&metadata)?;

    let provisioner = Provisioner::new(state.pool(), state.identity());
    match provisioner.provision(&external_id, &email, &profile).await? {
        ProvisionOutcome::Created(record) => {
            tracing::info!(
                user_id = %record.id,
                external_id = %external_id,
                "synced new user from webhook"
            );
            Ok(StatusCode::OK)
        }
        // Redelivery or lost race with the direct path: the record exists
        // and is linked, nothing to do.
        ProvisionOutcome::AlreadyProvisioned(_) => Ok(StatusCode::OK),
        // Record written but unlinked; fail so the provider redelivers and
        // the repair pass completes the link.
        ProvisionOutcome::Degraded(record) => Err(AppError::Internal(format!(
            "metadata sync failed for user {}",
            record.id
        ))),
    }
}
