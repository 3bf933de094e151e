//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! hl-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `HEMOLINK_DATABASE_URL` - `PostgreSQL` connection string (PostGIS
//!   enabled; `DATABASE_URL` works as a fallback)
//!
//! Migration files live in `crates/server/migrations/` and are embedded at
//! compile time, so the binary migrates without access to the source tree.

use tracing::info;

use super::CommandError;

/// Run all pending database migrations.
///
/// # Errors
///
/// Returns an error if the connection string is missing, the database is
/// unreachable, or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let url = super::database_url()?;

    info!("Connecting to database...");
    let pool = super::connect(&url).await?;

    info!("Running migrations...");
    sqlx::migrate!("../server/migrations").run(&pool).await?;

    info!("Migrations complete!");
    Ok(())
}
