//! Integration tests for Hemolink.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p hemolink-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `identity_flow` - Full session-to-metadata chain against a mock provider
//! - `webhook_verification` - Signed-event acceptance and rejection vectors
//! - `profile_validation` - The validation matrix both entry paths share
//! - `donation_eligibility` - Eligibility window arithmetic
//!
//! Tests here exercise the crates through their public APIs only; anything
//! needing a live `PostgreSQL` + PostGIS instance belongs in a deployment
//! smoke test, not this crate.
