//! User domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};

use portal_core::{Email, UserId};

/// A registered account (domain type).
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Postal address, free text.
    pub address: String,
    /// Phone number, free text.
    pub phone: String,
    /// Login identifier, unique across users.
    pub email: Email,
    /// Argon2 PHC string.
    pub password_hash: String,
    /// When the user registered.
    pub created_at: DateTime<Utc>,
}

/// A user ready to be inserted. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: Email,
    pub password_hash: String,
}

/// Maximum character counts of the profile columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLimits {
    pub name: usize,
    pub address: usize,
    pub phone: usize,
    pub email: usize,
}

/// Column sizes of the `users` table.
pub const FIELD_LIMITS: FieldLimits = FieldLimits {
    name: 100,
    address: 255,
    phone: 20,
    email: Email::MAX_LENGTH,
};
