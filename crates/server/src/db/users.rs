//! User repository for database operations.
//!
//! Queries use the runtime-checked sqlx API rather than the `query!` macros:
//! the PostGIS expressions (`ST_GeogFromText`, `ST_X`/`ST_Y` casts) are not
//! verifiable by the macros' prepared-statement metadata.

use sqlx::PgPool;

use hemolink_core::{ExternalUserId, GeoPoint, UserId};

use super::RepositoryError;
use crate::models::{NewUserRecord, UserRecord};

/// Columns shared by every user query. Location is read back as lat/lng
/// doubles because the geography wire format is opaque to sqlx.
const USER_COLUMNS: &str = r"
    id, external_id, email, name, role, blood_group, last_donation_date,
    ST_Y(location::geometry) AS lat,
    ST_X(location::geometry) AS lng,
    created_at
";

/// Raw row shape before domain conversion.
#[derive(sqlx::FromRow)]
struct UserRow {
    id: UserId,
    external_id: ExternalUserId,
    email: hemolink_core::Email,
    name: String,
    role: hemolink_core::Role,
    blood_group: Option<hemolink_core::BloodGroup>,
    last_donation_date: Option<chrono::NaiveDate>,
    lat: f64,
    lng: f64,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl TryFrom<UserRow> for UserRecord {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let location = GeoPoint::new(row.lat, row.lng).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid location in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            external_id: row.external_id,
            email: row.email,
            name: row.name,
            role: row.role,
            blood_group: row.blood_group,
            last_donation_date: row.last_donation_date,
            location,
            created_at: row.created_at,
        })
    }
}

/// Repository for User Record operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert exactly one User Record and return it.
    ///
    /// The UNIQUE constraint on `external_id` is the sole serialization
    /// point between the direct and webhook provisioning paths: when both
    /// race, one insert succeeds and the other observes `Conflict`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a record already exists for
    /// this `external_id`. Callers must treat that as terminal and must not
    /// retry the insert. Returns `RepositoryError::Database` for transport
    /// or other database errors; those retries are safe because a repeated
    /// insert can only yield `Conflict`, never a second row.
    pub async fn create(&self, new_user: &NewUserRecord) -> Result<UserRecord, RepositoryError> {
        let sql = format!(
            r"
            INSERT INTO users
                (external_id, email, name, role, blood_group, last_donation_date, location)
            VALUES ($1, $2, $3, $4, $5, $6, ST_GeogFromText($7))
            RETURNING {USER_COLUMNS}
            "
        );

        let row: UserRow = sqlx::query_as(&sql)
            .bind(&new_user.external_id)
            .bind(&new_user.email)
            .bind(&new_user.name)
            .bind(new_user.role)
            .bind(new_user.blood_group)
            .bind(new_user.last_donation_date)
            .bind(new_user.location.to_ewkt())
            .fetch_one(self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_unique_violation()
                {
                    return RepositoryError::Conflict(format!(
                        "user record already exists for external id {}",
                        new_user.external_id
                    ));
                }
                RepositoryError::Database(e)
            })?;

        row.try_into()
    }

    /// Get a user by their external identity-provider id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored value is invalid.
    pub async fn find_by_external_id(
        &self,
        external_id: &ExternalUserId,
    ) -> Result<Option<UserRecord>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE external_id = $1");

        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(external_id)
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a user by their internal id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored value is invalid.
    pub async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }
}
