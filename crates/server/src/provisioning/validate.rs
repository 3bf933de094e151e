//! Profile request validation.
//!
//! Both provisioning paths funnel their raw input through this module
//! before anything touches the store. Validation collects field-level
//! messages rather than failing on the first problem, so clients can fix a
//! whole form in one round trip.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use hemolink_core::{BloodGroup, GeoPoint, Role};

use crate::identity::SignupMetadata;

/// A single field-level validation message.
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// The collected validation failures for one submission.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct ProfileErrors {
    pub errors: Vec<FieldError>,
}

impl std::error::Error for ProfileErrors {}

impl std::fmt::Display for ProfileErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fields: Vec<&str> = self.errors.iter().map(|e| e.field).collect();
        write!(f, "invalid profile: {}", fields.join(", "))
    }
}

/// Raw location as submitted.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LocationInput {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

/// Raw body of the direct profile-creation call.
///
/// Field naming follows the public API contract: camelCase names,
/// snake_case medical fields.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileSubmission {
    #[serde(rename = "firstName")]
    pub first_name: Option<String>,
    #[serde(rename = "lastName")]
    pub last_name: Option<String>,
    pub role: Option<String>,
    pub blood_group: Option<String>,
    pub last_donation_date: Option<String>,
    pub location: Option<LocationInput>,
}

/// A fully validated profile, ready for the record writer.
#[derive(Debug, Clone)]
pub struct ValidProfile {
    pub name: String,
    pub role: Role,
    pub blood_group: Option<BloodGroup>,
    pub last_donation_date: Option<NaiveDate>,
    pub location: GeoPoint,
}

/// Collects field errors while individual checks produce their values.
#[derive(Default)]
struct Checker {
    errors: Vec<FieldError>,
}

impl Checker {
    fn fail(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    fn role(&mut self, raw: Option<&str>, default: Option<Role>) -> Option<Role> {
        match raw {
            Some(s) => match s.parse::<Role>() {
                Ok(role) => Some(role),
                Err(e) => {
                    self.fail("role", e.to_string());
                    None
                }
            },
            None => match default {
                Some(role) => Some(role),
                None => {
                    self.fail("role", "role is required");
                    None
                }
            },
        }
    }

    /// Blood group is required for donors and discarded for staff, no
    /// matter what was submitted.
    fn blood_group(&mut self, raw: Option<&str>, role: Option<Role>) -> Option<BloodGroup> {
        match role {
            Some(Role::Staff) | None => None,
            Some(Role::Donor) => match raw {
                Some(s) => match s.parse::<BloodGroup>() {
                    Ok(group) => Some(group),
                    Err(e) => {
                        self.fail("blood_group", e.to_string());
                        None
                    }
                },
                None => {
                    self.fail("blood_group", "blood group is required for donors");
                    None
                }
            },
        }
    }

    fn location(&mut self, raw: Option<LocationInput>) -> Option<GeoPoint> {
        let Some(input) = raw else {
            self.fail("location", "location is required");
            return None;
        };
        let (Some(lat), Some(lng)) = (input.lat, input.lng) else {
            self.fail("location", "location.lat and location.lng are required");
            return None;
        };
        match GeoPoint::new(lat, lng) {
            Ok(point) => Some(point),
            Err(e) => {
                self.fail("location", e.to_string());
                None
            }
        }
    }

    fn last_donation_date(&mut self, raw: Option<&str>) -> Option<NaiveDate> {
        let s = raw?;
        let date = match NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            Ok(date) => date,
            Err(_) => {
                self.fail("last_donation_date", "must be a YYYY-MM-DD date");
                return None;
            }
        };
        if date > Utc::now().date_naive() {
            self.fail("last_donation_date", "cannot be in the future");
            return None;
        }
        Some(date)
    }

    fn finish(self, profile: Option<ValidProfile>) -> Result<ValidProfile, ProfileErrors> {
        match profile {
            Some(p) if self.errors.is_empty() => Ok(p),
            _ => Err(ProfileErrors {
                errors: self.errors,
            }),
        }
    }
}

impl ProfileSubmission {
    /// Validate the direct-path submission.
    ///
    /// # Errors
    ///
    /// Returns `ProfileErrors` carrying one message per failed field.
    pub fn validate(&self) -> Result<ValidProfile, ProfileErrors> {
        let mut check = Checker::default();

        let first = self.first_name.as_deref().map(str::trim).unwrap_or("");
        if first.is_empty() {
            check.fail("firstName", "first name is required");
        }
        let last = self.last_name.as_deref().map(str::trim).unwrap_or("");
        if last.is_empty() {
            check.fail("lastName", "last name is required");
        }

        let role = check.role(self.role.as_deref(), None);
        let blood_group = check.blood_group(self.blood_group.as_deref(), role);
        let location = check.location(self.location);
        let last_donation_date = check.last_donation_date(self.last_donation_date.as_deref());

        let profile = match (role, location) {
            (Some(role), Some(location)) => Some(ValidProfile {
                name: format!("{first} {last}").trim().to_owned(),
                role,
                blood_group,
                last_donation_date,
                location,
            }),
            _ => None,
        };

        check.finish(profile)
    }
}

/// Validate the metadata attached to a signup event.
///
/// The webhook path defaults what the provider's signup form did not
/// capture: role falls back to donor and the display name to "New User".
///
/// # Errors
///
/// Returns `ProfileErrors` carrying one message per failed field.
pub fn validate_signup_metadata(meta: &SignupMetadata) -> Result<ValidProfile, ProfileErrors> {
    let mut check = Checker::default();

    let role = check.role(meta.role.as_deref(), Some(Role::Donor));
    let blood_group = check.blood_group(meta.blood_group.as_deref(), role);
    let location = check.location(meta.location);
    let last_donation_date = check.last_donation_date(meta.last_donation_date.as_deref());

    let name = meta
        .name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("New User")
        .to_owned();

    let profile = match (role, location) {
        (Some(role), Some(location)) => Some(ValidProfile {
            name,
            role,
            blood_group,
            last_donation_date,
            location,
        }),
        _ => None,
    };

    check.finish(profile)
}
