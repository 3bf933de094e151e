//! Identity provider integration.
//!
//! The identity provider owns signup, sessions, and a per-user key-value
//! metadata bag. Hemolink talks to it in three ways:
//!
//! - resolving a bearer session credential to a stable external user id
//!   ([`IdentityClient::resolve_session`])
//! - reading a user's verified contact record and metadata
//!   ([`IdentityClient::get_user`])
//! - patching the metadata bag with the internal database id after a User
//!   Record is created ([`IdentityClient::update_public_metadata`])
//!
//! Webhook notifications from the provider are authenticated separately via
//! [`signature::WebhookVerifier`]; no provider round trip is needed on that
//! path.

pub mod client;
pub mod events;
pub mod signature;

pub use client::{IdentityClient, IdentityError, IdentityUser};
pub use events::{EventUser, SignupMetadata, WebhookEvent};
pub use signature::{SignatureError, WebhookVerifier};

/// Metadata key holding the internal database id.
pub const METADATA_DB_ID: &str = "db_id";

/// Metadata key echoing the provisioned role.
pub const METADATA_ROLE: &str = "role";
