//! User Record domain types.
//!
//! These types represent validated domain objects separate from database row
//! types.

use chrono::{DateTime, NaiveDate, Utc};

use hemolink_core::{BloodGroup, Email, ExternalUserId, GeoPoint, Role, UserId};

/// The authoritative user row.
///
/// Created exactly once per external identity; `role`, `blood_group`, and
/// `location` have no mutation path after creation. Response bodies project
/// it into their own serializable types.
#[derive(Debug, Clone)]
pub struct UserRecord {
    /// Internal database id, assigned at insert time.
    pub id: UserId,
    /// Stable identifier from the identity provider.
    pub external_id: ExternalUserId,
    /// Verified email captured from the provider at creation time.
    pub email: Email,
    /// Display name derived from first/last name.
    pub name: String,
    /// Provisioned role.
    pub role: Role,
    /// Present iff `role` is donor.
    pub blood_group: Option<BloodGroup>,
    /// Most recent donation, if any.
    pub last_donation_date: Option<NaiveDate>,
    /// Geographic location of the user.
    pub location: GeoPoint,
    /// Server-assigned creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Fields for the single authoritative insert.
///
/// Produced by the profile validator plus the session/event verifier; the
/// repository never sees unvalidated input.
#[derive(Debug, Clone)]
pub struct NewUserRecord {
    pub external_id: ExternalUserId,
    pub email: Email,
    pub name: String,
    pub role: Role,
    pub blood_group: Option<BloodGroup>,
    pub last_donation_date: Option<NaiveDate>,
    pub location: GeoPoint,
}
