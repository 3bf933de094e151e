//! Hemolink Core - Shared domain types.
//!
//! This crate provides the common types used across all Hemolink components:
//! - `server` - Provisioning API and webhook receiver
//! - `cli` - Migrations and seed data tooling
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and usable anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, roles, blood groups, and geographic points
//! - [`donation`] - Donation eligibility window arithmetic

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod donation;
pub mod types;

pub use types::*;
