//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// A form field does not fit its column.
    #[error("{field} must be at most {max} characters")]
    FieldTooLong {
        /// Form field name.
        field: &'static str,
        /// Maximum allowed characters.
        max: usize,
    },

    /// A required form field is empty.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
