//! User provisioning orchestration.
//!
//! Both entry paths (direct profile call, signed webhook event) drive the
//! same sequence: validate, insert the User Record, patch the provider
//! metadata with the new internal id. The store's UNIQUE constraint on
//! `external_id` is the only coordination between the paths; the insert and
//! the metadata patch span two systems and are explicitly not atomic.
//!
//! Failure contract:
//! - validation failures are terminal with no side effect
//! - a duplicate insert is terminal; the existing record wins and the
//!   orchestrator instead repairs provider metadata if a previous attempt
//!   left it unlinked
//! - once the insert commits, nothing rolls it back; a failed patch
//!   degrades the outcome and is healed by the repair pass on any
//!   subsequent request for the same user

use sqlx::PgPool;

use hemolink_core::{Email, ExternalUserId};

use crate::db::{RepositoryError, UserRepository};
use crate::identity::{IdentityClient, IdentityError, METADATA_DB_ID, METADATA_ROLE};
use crate::models::{NewUserRecord, UserRecord};

pub mod validate;

pub use validate::{ProfileErrors, ProfileSubmission, ValidProfile, validate_signup_metadata};

/// Store operations the orchestrator sequences.
///
/// `UserRepository` is the production implementation; tests substitute an
/// in-memory store to drive the outcome transitions without a database.
#[allow(async_fn_in_trait)]
pub trait UserStore {
    /// Insert exactly one record, or `Conflict` when one already exists
    /// for this external id.
    async fn create(&self, new_user: &NewUserRecord) -> Result<UserRecord, RepositoryError>;

    /// Read a record back by its external id.
    async fn find_by_external_id(
        &self,
        external_id: &ExternalUserId,
    ) -> Result<Option<UserRecord>, RepositoryError>;
}

impl UserStore for UserRepository<'_> {
    async fn create(&self, new_user: &NewUserRecord) -> Result<UserRecord, RepositoryError> {
        // Inherent method; resolution prefers it over the trait fn.
        UserRepository::create(self, new_user).await
    }

    async fn find_by_external_id(
        &self,
        external_id: &ExternalUserId,
    ) -> Result<Option<UserRecord>, RepositoryError> {
        UserRepository::find_by_external_id(self, external_id).await
    }
}

/// Terminal states of one provisioning request.
#[derive(Debug)]
pub enum ProvisionOutcome {
    /// Insert and metadata patch both succeeded.
    Created(UserRecord),
    /// A record already existed for this external id; no row was written.
    /// Provider metadata was repaired if a previous attempt left it
    /// unlinked.
    AlreadyProvisioned(UserRecord),
    /// The insert committed but the metadata patch failed. The record
    /// stands; consumers that trust only the metadata flag will treat the
    /// user as not yet provisioned until a repair pass completes.
    Degraded(UserRecord),
}

impl ProvisionOutcome {
    /// The record this outcome settled on.
    #[must_use]
    pub const fn record(&self) -> &UserRecord {
        match self {
            Self::Created(r) | Self::AlreadyProvisioned(r) | Self::Degraded(r) => r,
        }
    }
}

/// Errors that abort provisioning before or at the insert.
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error(transparent)]
    Store(#[from] RepositoryError),
    #[error(transparent)]
    Provider(#[from] IdentityError),
}

/// Sequences the record writer and the metadata patcher.
pub struct Provisioner<'a, S = UserRepository<'a>> {
    store: S,
    identity: &'a IdentityClient,
}

impl<'a> Provisioner<'a> {
    /// Create a provisioner over the given store and provider handles.
    #[must_use]
    pub const fn new(pool: &'a PgPool, identity: &'a IdentityClient) -> Self {
        Self {
            store: UserRepository::new(pool),
            identity,
        }
    }
}

impl<'a, S: UserStore> Provisioner<'a, S> {
    /// Create a provisioner over an arbitrary store implementation.
    #[must_use]
    pub const fn with_store(store: S, identity: &'a IdentityClient) -> Self {
        Self { store, identity }
    }

    /// Run the insert-then-patch sequence for one verified, validated
    /// request.
    ///
    /// # Errors
    ///
    /// Returns `ProvisionError::Store` if the insert fails for any reason
    /// other than a duplicate, or if the duplicate's row cannot be read
    /// back. Metadata patch failures never surface as errors; they degrade
    /// the outcome instead.
    pub async fn provision(
        &self,
        external_id: &ExternalUserId,
        email: &Email,
        profile: &ValidProfile,
    ) -> Result<ProvisionOutcome, ProvisionError> {
        let new_user = NewUserRecord {
            external_id: external_id.clone(),
            email: email.clone(),
            name: profile.name.clone(),
            role: profile.role,
            blood_group: profile.blood_group,
            last_donation_date: profile.last_donation_date,
            location: profile.location,
        };

        match self.store.create(&new_user).await {
            Ok(record) => {
                let payload = metadata_payload(&record);
                match self
                    .identity
                    .update_public_metadata(external_id, payload)
                    .await
                {
                    Ok(()) => {
                        tracing::info!(
                            user_id = %record.id,
                            external_id = %external_id,
                            "provisioned new user"
                        );
                        Ok(ProvisionOutcome::Created(record))
                    }
                    Err(e) => {
                        // The insert stands; the repair pass will relink.
                        tracing::warn!(
                            user_id = %record.id,
                            external_id = %external_id,
                            error = %e,
                            "metadata patch failed after insert; record left unlinked"
                        );
                        Ok(ProvisionOutcome::Degraded(record))
                    }
                }
            }
            Err(RepositoryError::Conflict(_)) => {
                // The other path won the race (or this is a redelivery).
                let record = self
                    .store
                    .find_by_external_id(external_id)
                    .await?
                    .ok_or(RepositoryError::NotFound)?;
                self.repair_metadata(&record).await
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Re-link provider metadata for an existing record if a previous
    /// attempt never completed the patch.
    ///
    /// Reads the provider's metadata bag; a missing `db_id` means the user
    /// is stuck in the degraded state and gets patched again. Patching is
    /// idempotent, so a concurrent repair is harmless.
    async fn repair_metadata(
        &self,
        record: &UserRecord,
    ) -> Result<ProvisionOutcome, ProvisionError> {
        let user = match self.identity.get_user(&record.external_id).await {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!(
                    user_id = %record.id,
                    external_id = %record.external_id,
                    error = %e,
                    "could not read provider metadata for repair check"
                );
                return Ok(ProvisionOutcome::Degraded(record.clone()));
            }
        };

        if !needs_repair(&user.public_metadata) {
            return Ok(ProvisionOutcome::AlreadyProvisioned(record.clone()));
        }

        match self
            .identity
            .update_public_metadata(&record.external_id, metadata_payload(record))
            .await
        {
            Ok(()) => {
                tracing::info!(
                    user_id = %record.id,
                    external_id = %record.external_id,
                    "repaired unlinked provider metadata"
                );
                Ok(ProvisionOutcome::AlreadyProvisioned(record.clone()))
            }
            Err(e) => {
                tracing::warn!(
                    user_id = %record.id,
                    external_id = %record.external_id,
                    error = %e,
                    "metadata repair failed; record still unlinked"
                );
                Ok(ProvisionOutcome::Degraded(record.clone()))
            }
        }
    }
}

/// The metadata written back to the provider after a successful insert.
fn metadata_payload(record: &UserRecord) -> serde_json::Value {
    let mut payload = serde_json::json!({
        METADATA_DB_ID: record.id.as_i32(),
        METADATA_ROLE: record.role.as_str(),
    });
    if let Some(group) = record.blood_group
        && let Some(map) = payload.as_object_mut()
    {
        map.insert(
            "blood_group".to_owned(),
            serde_json::Value::String(group.as_str().to_owned()),
        );
    }
    payload
}

/// Whether the provider metadata bag is missing its database link.
fn needs_repair(metadata: &serde_json::Map<String, serde_json::Value>) -> bool {
    !metadata.contains_key(METADATA_DB_ID)
}
