//! Core types for Hemolink.
//!
//! Type-safe wrappers for the domain concepts shared by the server and CLI.

pub mod blood;
pub mod email;
pub mod geo;
pub mod id;
pub mod role;

pub use blood::{BloodGroup, BloodGroupError};
pub use email::{Email, EmailError};
pub use geo::{GeoPoint, GeoPointError};
pub use id::*;
pub use role::Role;
