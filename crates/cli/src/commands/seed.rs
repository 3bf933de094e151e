//! Seed the database with sample donor records.
//!
//! Intended for local development: gives the dashboard and the read-back
//! route real rows to work with. Inserts are keyed on `external_id` and
//! skip rows that already exist, so the command is safe to re-run.

use chrono::NaiveDate;
use tracing::info;

use hemolink_core::{BloodGroup, GeoPoint, Role};

use super::CommandError;

struct SampleDonor {
    external_id: &'static str,
    email: &'static str,
    name: &'static str,
    role: Role,
    blood_group: Option<BloodGroup>,
    last_donation_date: Option<NaiveDate>,
    lat: f64,
    lng: f64,
}

fn sample_donors() -> Vec<SampleDonor> {
    vec![
        SampleDonor {
            external_id: "seed_user_asha",
            email: "asha@example.com",
            name: "Asha Nair",
            role: Role::Donor,
            blood_group: Some(BloodGroup::ONegative),
            last_donation_date: NaiveDate::from_ymd_opt(2026, 6, 12),
            lat: 12.9716,
            lng: 77.5946,
        },
        SampleDonor {
            external_id: "seed_user_marco",
            email: "marco@example.com",
            name: "Marco Ruiz",
            role: Role::Donor,
            blood_group: Some(BloodGroup::APositive),
            last_donation_date: None,
            lat: 41.3874,
            lng: 2.1686,
        },
        SampleDonor {
            external_id: "seed_user_lena",
            email: "lena@example.com",
            name: "Lena Hoffmann",
            role: Role::Donor,
            blood_group: Some(BloodGroup::AbNegative),
            last_donation_date: NaiveDate::from_ymd_opt(2026, 8, 1),
            lat: 52.52,
            lng: 13.405,
        },
        SampleDonor {
            external_id: "seed_user_coord",
            email: "coordinator@example.com",
            name: "Drive Coordinator",
            role: Role::Staff,
            blood_group: None,
            last_donation_date: None,
            lat: 51.5072,
            lng: -0.1276,
        },
    ]
}

/// Insert the sample donors, skipping any that already exist.
///
/// # Errors
///
/// Returns an error if the connection string is missing or an insert fails.
pub async fn run() -> Result<(), CommandError> {
    let url = super::database_url()?;
    let pool = super::connect(&url).await?;

    let donors = sample_donors();
    let mut inserted = 0_u32;
    let mut skipped = 0_u32;

    for donor in &donors {
        let location = GeoPoint::new(donor.lat, donor.lng)
            .map_err(|e| sqlx::Error::Protocol(e.to_string()))?;

        let result = sqlx::query(
            r"
            INSERT INTO users (external_id, email, name, role, blood_group, last_donation_date, location)
            VALUES ($1, $2, $3, $4, $5, $6, ST_GeogFromText($7))
            ON CONFLICT (external_id) DO NOTHING
            ",
        )
        .bind(donor.external_id)
        .bind(donor.email)
        .bind(donor.name)
        .bind(donor.role.as_str())
        .bind(donor.blood_group.map(BloodGroup::as_str))
        .bind(donor.last_donation_date)
        .bind(location.to_ewkt())
        .execute(&pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
            info!(external_id = donor.external_id, "Inserted sample donor");
        } else {
            skipped += 1;
        }
    }

    info!(inserted, skipped, "Seeding complete");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_donors_satisfy_store_constraints() {
        // The users table enforces role/blood-group pairing and a valid
        // location; bad sample data would make every seed run fail.
        for donor in sample_donors() {
            match donor.role {
                Role::Donor => assert!(donor.blood_group.is_some(), "{}", donor.external_id),
                Role::Staff => assert!(donor.blood_group.is_none(), "{}", donor.external_id),
            }
            assert!(GeoPoint::new(donor.lat, donor.lng).is_ok(), "{}", donor.external_id);
        }
    }

    #[test]
    fn test_sample_external_ids_unique() {
        let donors = sample_donors();
        let mut ids: Vec<&str> = donors.iter().map(|d| d.external_id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), donors.len());
    }
}
