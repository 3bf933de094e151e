//! Webhook event envelope types.
//!
//! The provider pushes change notifications as signed JSON envelopes. Only
//! `user.created` drives provisioning; other event types are acknowledged
//! and ignored.

use serde::Deserialize;

use crate::provisioning::validate::LocationInput;

/// Event type that triggers provisioning.
pub const USER_CREATED: &str = "user.created";

/// Outer event envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: EventUser,
}

/// The user payload carried by a `user.created` event.
#[derive(Debug, Clone, Deserialize)]
pub struct EventUser {
    /// Stable external identifier.
    pub id: String,
    /// Verified email addresses, primary first.
    #[serde(default)]
    pub email_addresses: Vec<EventEmailAddress>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Metadata set by our own patcher (or empty for a fresh signup).
    #[serde(default)]
    pub public_metadata: serde_json::Map<String, serde_json::Value>,
    /// Metadata captured by the provider's signup form, client-controlled.
    #[serde(default)]
    pub unsafe_metadata: serde_json::Map<String, serde_json::Value>,
}

/// One entry of the event's email address set.
#[derive(Debug, Clone, Deserialize)]
pub struct EventEmailAddress {
    pub email_address: String,
}

impl EventUser {
    /// The primary email address, if the event carries one.
    #[must_use]
    pub fn primary_email(&self) -> Option<&str> {
        self.email_addresses
            .first()
            .map(|entry| entry.email_address.as_str())
    }

    /// Merge the two metadata bags, client-captured keys winning.
    ///
    /// This mirrors the signup flow: the provider's form stores the profile
    /// fields in unsafe metadata, while public metadata only holds what our
    /// patcher wrote on a previous (partially failed) attempt.
    #[must_use]
    pub fn merged_metadata(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut merged = self.public_metadata.clone();
        for (key, value) in &self.unsafe_metadata {
            merged.insert(key.clone(), value.clone());
        }
        merged
    }
}

/// Profile fields captured as opaque metadata during the provider's own
/// signup form, as they arrive on the event.
#[derive(Debug, Clone, Deserialize)]
pub struct SignupMetadata {
    pub name: Option<String>,
    pub role: Option<String>,
    pub blood_group: Option<String>,
    pub location: Option<LocationInput>,
    pub last_donation_date: Option<String>,
    /// Present when a previous provisioning attempt already patched it.
    pub db_id: Option<i32>,
}

impl SignupMetadata {
    /// Parse the merged metadata bag of an event.
    ///
    /// # Errors
    ///
    /// Returns the serde error if a present field has the wrong shape.
    pub fn from_event(user: &EventUser) -> Result<Self, serde_json::Error> {
        serde_json::from_value(serde_json::Value::Object(user.merged_metadata()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_event() -> WebhookEvent {
        serde_json::from_value(serde_json::json!({
            "type": "user.created",
            "object": "event",
            "data": {
                "id": "user_2abc",
                "email_addresses": [{ "email_address": "ann@x.com" }],
                "first_name": "Ann",
                "last_name": "Lee",
                "public_metadata": { "role": "staff" },
                "unsafe_metadata": {
                    "role": "donor",
                    "blood_group": "O-",
                    "location": { "lat": 12.9, "lng": 77.6 }
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_envelope_parses() {
        let event = sample_event();
        assert_eq!(event.event_type, USER_CREATED);
        assert_eq!(event.data.id, "user_2abc");
        assert_eq!(event.data.primary_email(), Some("ann@x.com"));
    }

    #[test]
    fn test_unsafe_metadata_wins_merge() {
        let merged = sample_event().data.merged_metadata();
        assert_eq!(merged.get("role").unwrap(), "donor");
    }

    #[test]
    fn test_signup_metadata_from_event() {
        let event = sample_event();
        let meta = SignupMetadata::from_event(&event.data).unwrap();
        assert_eq!(meta.role.as_deref(), Some("donor"));
        assert_eq!(meta.blood_group.as_deref(), Some("O-"));
        assert!(meta.location.is_some());
        assert!(meta.db_id.is_none());
    }

    #[test]
    fn test_missing_metadata_defaults_empty() {
        let event: WebhookEvent = serde_json::from_value(serde_json::json!({
            "type": "user.created",
            "data": { "id": "user_x", "first_name": null, "last_name": null }
        }))
        .unwrap();

        assert!(event.data.primary_email().is_none());
        assert!(event.data.merged_metadata().is_empty());
    }
}
