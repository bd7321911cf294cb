//! User repository backed by `PostgreSQL`.
//!
//! Queries are checked at runtime (`query_as`) so the workspace builds
//! without a live database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use portal_core::{Email, UserId};

use super::{RepositoryError, UserStore};
use crate::models::{NewUser, User};

/// Row shape of the `users` table.
#[derive(sqlx::FromRow)]
struct UserRow {
    id: UserId,
    name: String,
    address: String,
    phone: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            name: row.name,
            address: row.address,
            phone: row.phone,
            email,
            password_hash: row.password_hash,
            created_at: row.created_at,
        })
    }
}

/// Repository for user database operations.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, name, address, phone, email, password_hash, created_at
            FROM users
            WHERE email = $1
            ",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Create a new user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    async fn insert(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO users (name, address, phone, email, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, address, phone, email, password_hash, created_at
            ",
        )
        .bind(&user.name)
        .bind(&user.address)
        .bind(&user.phone)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("email already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        User::try_from(row)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
