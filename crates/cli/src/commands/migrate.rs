//! Database migration command.
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string, or
//! - `DB_USER`, `DB_PASSWORD`, `DB_HOST`, `DB_PORT`, `DB_NAME` - its parts
//!
//! # Migration Files
//!
//! Portal migrations: `crates/web/migrations/`

use portal_web::config::{ConfigError, database_url_from_env};
use portal_web::db;
use thiserror::Error;

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Database settings are missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Apply the portal migrations.
///
/// # Errors
///
/// Returns an error if the database settings are missing, the database is
/// unreachable, or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    dotenvy::dotenv().ok();

    let database_url = database_url_from_env()?;

    tracing::info!("Connecting to portal database...");
    let pool = db::create_pool(&database_url).await?;

    tracing::info!("Running portal migrations...");
    db::run_migrations(&pool).await?;

    tracing::info!("Portal migrations complete!");
    Ok(())
}
