//! CLI command implementations.

pub mod migrate;
pub mod seed;

use secrecy::SecretString;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Errors shared by CLI commands.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Load the store connection string, preferring `HEMOLINK_DATABASE_URL` and
/// falling back to `DATABASE_URL`.
pub fn database_url() -> Result<SecretString, CommandError> {
    dotenvy::dotenv().ok();

    std::env::var("HEMOLINK_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("HEMOLINK_DATABASE_URL"))
}

/// Connect to the store with a small pool suited to one-shot commands.
pub async fn connect(url: &SecretString) -> Result<PgPool, CommandError> {
    use secrecy::ExposeSecret;

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(url.expose_secret())
        .await?;
    Ok(pool)
}
