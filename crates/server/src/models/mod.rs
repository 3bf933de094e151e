//! Domain models for the server.

pub mod user;

pub use user::{NewUserRecord, UserRecord};
