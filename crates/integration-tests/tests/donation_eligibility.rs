//! Eligibility window over validated profile data.

use chrono::NaiveDate;
use serde_json::json;

use hemolink_core::donation::{is_eligible_on, next_eligible_date};
use hemolink_server::provisioning::ProfileSubmission;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).expect("valid calendar date")
}

#[test]
fn test_validated_donation_date_feeds_eligibility() {
    let submission: ProfileSubmission = serde_json::from_value(json!({
        "firstName": "Ann",
        "lastName": "Lee",
        "role": "donor",
        "blood_group": "O-",
        "last_donation_date": "2026-06-12",
        "location": { "lat": 12.9, "lng": 77.6 }
    }))
    .expect("submission parses");

    let profile = submission.validate().expect("valid donor");
    let last = profile.last_donation_date.expect("date present");

    assert_eq!(next_eligible_date(last), d(2026, 8, 7));
    assert!(!is_eligible_on(profile.last_donation_date, d(2026, 8, 6)));
    assert!(is_eligible_on(profile.last_donation_date, d(2026, 8, 7)));
}

#[test]
fn test_first_time_donor_is_eligible_immediately() {
    let submission: ProfileSubmission = serde_json::from_value(json!({
        "firstName": "Marco",
        "lastName": "Ruiz",
        "role": "donor",
        "blood_group": "A+",
        "location": { "lat": 41.38, "lng": 2.17 }
    }))
    .expect("submission parses");

    let profile = submission.validate().expect("valid donor");
    assert!(profile.last_donation_date.is_none());
    assert!(is_eligible_on(profile.last_donation_date, d(2026, 1, 1)));
}
