//! The validation matrix both entry paths share.
//!
//! The direct path parses a typed submission body; the webhook path parses
//! the event's merged metadata bag. Both must settle on the same rules:
//! staff never carry a blood group, donors must, locations stay in bounds,
//! donation dates are past-or-today.

use serde_json::json;

use hemolink_core::{BloodGroup, Role};
use hemolink_server::identity::{SignupMetadata, WebhookEvent};
use hemolink_server::provisioning::{ProfileSubmission, validate_signup_metadata};

fn submission(body: serde_json::Value) -> ProfileSubmission {
    serde_json::from_value(body).expect("submission body parses")
}

#[test]
fn test_direct_and_webhook_paths_agree_on_a_donor() {
    let direct = submission(json!({
        "firstName": "Ann",
        "lastName": "Lee",
        "role": "donor",
        "blood_group": "O-",
        "last_donation_date": "2026-06-12",
        "location": { "lat": 12.9716, "lng": 77.5946 }
    }))
    .validate()
    .expect("valid donor");

    let event: WebhookEvent = serde_json::from_value(json!({
        "type": "user.created",
        "data": {
            "id": "user_1",
            "email_addresses": [{ "email_address": "ann@x.com" }],
            "first_name": "Ann",
            "last_name": "Lee",
            "unsafe_metadata": {
                "name": "Ann Lee",
                "role": "donor",
                "blood_group": "O-",
                "last_donation_date": "2026-06-12",
                "location": { "lat": 12.9716, "lng": 77.5946 }
            }
        }
    }))
    .expect("event parses");
    let meta = SignupMetadata::from_event(&event.data).expect("metadata parses");
    let webhook = validate_signup_metadata(&meta).expect("valid donor");

    assert_eq!(direct.name, webhook.name);
    assert_eq!(direct.role, webhook.role);
    assert_eq!(direct.blood_group, webhook.blood_group);
    assert_eq!(direct.last_donation_date, webhook.last_donation_date);
    assert_eq!(direct.location, webhook.location);
}

#[test]
fn test_bare_webhook_signup_gets_defaults() {
    // A signup that captured nothing but a location: role defaults to
    // donor, which then requires a blood group.
    let meta: SignupMetadata = serde_json::from_value(json!({
        "location": { "lat": 0.0, "lng": 0.0 }
    }))
    .expect("metadata parses");

    let err = validate_signup_metadata(&meta).expect_err("donor default needs blood group");
    assert!(err.errors.iter().any(|e| e.field == "blood_group"));

    let meta: SignupMetadata = serde_json::from_value(json!({
        "blood_group": "B+",
        "location": { "lat": 0.0, "lng": 0.0 }
    }))
    .expect("metadata parses");

    let profile = validate_signup_metadata(&meta).expect("valid with defaults");
    assert_eq!(profile.name, "New User");
    assert_eq!(profile.role, Role::Donor);
    assert_eq!(profile.blood_group, Some(BloodGroup::BPositive));
}

#[test]
fn test_staff_blood_group_dropped_on_both_paths() {
    let direct = submission(json!({
        "firstName": "Sam",
        "lastName": "Park",
        "role": "staff",
        "blood_group": "A+",
        "location": { "lat": 51.5, "lng": -0.12 }
    }))
    .validate()
    .expect("valid staff");
    assert_eq!(direct.blood_group, None);

    let meta: SignupMetadata = serde_json::from_value(json!({
        "name": "Sam Park",
        "role": "staff",
        "blood_group": "A+",
        "location": { "lat": 51.5, "lng": -0.12 }
    }))
    .expect("metadata parses");
    let webhook = validate_signup_metadata(&meta).expect("valid staff");
    assert_eq!(webhook.blood_group, None);
}

#[test]
fn test_all_field_errors_collected_in_one_pass() {
    let err = submission(json!({
        "firstName": "",
        "role": "superuser",
        "last_donation_date": "tomorrow",
        "location": { "lat": 123.0, "lng": 0.0 }
    }))
    .validate()
    .expect_err("everything is wrong");

    let fields: Vec<&str> = err.errors.iter().map(|e| e.field).collect();
    for expected in [
        "firstName",
        "lastName",
        "role",
        "location",
        "last_donation_date",
    ] {
        assert!(fields.contains(&expected), "missing field error: {expected}");
    }
}

#[test]
fn test_partial_location_rejected() {
    let err = submission(json!({
        "firstName": "Ann",
        "lastName": "Lee",
        "role": "staff",
        "location": { "lat": 12.9 }
    }))
    .validate()
    .expect_err("lng missing");

    assert!(err.errors.iter().any(|e| e.field == "location"));
}

#[test]
fn test_previously_patched_event_carries_db_id() {
    // Redelivered events for an already-linked user expose the db_id the
    // patcher wrote; the metadata still parses cleanly.
    let event: WebhookEvent = serde_json::from_value(json!({
        "type": "user.created",
        "data": {
            "id": "user_1",
            "public_metadata": { "db_id": 42, "role": "donor" },
            "unsafe_metadata": {
                "blood_group": "O-",
                "location": { "lat": 12.9, "lng": 77.6 }
            }
        }
    }))
    .expect("event parses");

    let meta = SignupMetadata::from_event(&event.data).expect("metadata parses");
    assert_eq!(meta.db_id, Some(42));
    assert!(validate_signup_metadata(&meta).is_ok());
}
