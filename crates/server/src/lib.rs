//! Hemolink server library.
//!
//! User provisioning for the Hemolink blood-donation platform: verifies
//! sessions against the identity provider, validates profile submissions,
//! writes User Records to the PostGIS-backed store, and links provider
//! accounts back to store rows via metadata.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod identity;
pub mod models;
pub mod provisioning;
pub mod query;
pub mod routes;
pub mod state;
