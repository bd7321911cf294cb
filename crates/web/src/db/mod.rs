//! Database operations for the portal's `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `users` - Registered accounts (unique email)
//! - `tower_sessions.session` - Tower-sessions storage, created by the session store
//!
//! # Migrations
//!
//! The `users` migration is embedded in the binary and applied at startup.
//! Operators can also apply it ahead of time:
//! ```bash
//! cargo run -p portal-cli -- migrate
//! ```

pub mod memory;
#[cfg(test)]
pub mod testing;
pub mod users;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;
use tower_sessions_sqlx_store::PostgresStore;

use portal_core::Email;

use crate::models::{NewUser, User};

pub use memory::MemoryUserStore;
pub use users::PgUserStore;

/// Embedded migrations for the `users` table.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Errors from the persistence layer.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Storage for user records.
///
/// Implementations must reject a second user with an existing email with
/// [`RepositoryError::Conflict`], whatever lookups callers did beforehand.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find a user by exact email.
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError>;

    /// Insert a new user and return it with its generated ID.
    async fn insert(&self, user: &NewUser) -> Result<User, RepositoryError>;

    /// Check that the backing store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Create the `users` table and the session table if they are absent.
///
/// # Errors
///
/// Returns `sqlx::Error` if either migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    MIGRATOR.run(pool).await?;
    PostgresStore::new(pool.clone()).migrate().await?;
    Ok(())
}
