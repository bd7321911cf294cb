//! Authentication service.
//!
//! Provides registration and email/password login.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use portal_core::{Email, EmailError};

use crate::db::{RepositoryError, UserStore};
use crate::models::{FIELD_LIMITS, NewUser, User};

/// Registration input as submitted, before any checks.
#[derive(Debug, Clone, Copy)]
pub struct Registration<'a> {
    pub name: &'a str,
    pub address: &'a str,
    pub phone: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

/// Authentication service.
///
/// Handles user registration and login against a [`UserStore`].
pub struct AuthService<'a> {
    users: &'a dyn UserStore,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(users: &'a dyn UserStore) -> Self {
        Self { users }
    }

    /// Register a new user.
    ///
    /// Profile fields are stored as submitted; they are only checked against
    /// their column sizes.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::FieldTooLong` if a field does not fit its column.
    /// Returns `AuthError::MissingField` if the email is empty.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(&self, registration: Registration<'_>) -> Result<User, AuthError> {
        check_length("name", registration.name, FIELD_LIMITS.name)?;
        check_length("address", registration.address, FIELD_LIMITS.address)?;
        check_length("phone", registration.phone, FIELD_LIMITS.phone)?;
        let email = Email::parse(registration.email).map_err(|e| match e {
            EmailError::Empty => AuthError::MissingField("email"),
            EmailError::TooLong { max } => AuthError::FieldTooLong {
                field: "email",
                max,
            },
        })?;

        // Advisory only: the unique constraint decides under concurrency.
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AuthError::UserAlreadyExists);
        }

        let password_hash = hash_password(registration.password)?;

        let user = self
            .users
            .insert(&NewUser {
                name: registration.name.to_owned(),
                address: registration.address.to_owned(),
                phone: registration.phone.to_owned(),
                email,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        Ok(user)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email is unknown or the
    /// password does not match. The two cases are indistinguishable.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &user.password_hash)?;

        Ok(user)
    }
}

/// Reject values that do not fit their column.
fn check_length(field: &'static str, value: &str, max: usize) -> Result<(), AuthError> {
    if value.chars().count() > max {
        return Err(AuthError::FieldTooLong { field, max });
    }
    Ok(())
}

/// Hash a password using Argon2id with a random salt.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` on mismatch or an unreadable hash.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryUserStore;
    use crate::db::testing::LosingRaceUserStore;

    fn registration<'a>(email: &'a str, password: &'a str) -> Registration<'a> {
        Registration {
            name: "Grace Hopper",
            address: "1 Compiler Rd",
            phone: "555-0199",
            email,
            password,
        }
    }

    #[test]
    fn test_hash_password_is_salted_phc() {
        let first = hash_password("correct horse").unwrap();
        let second = hash_password("correct horse").unwrap();

        assert!(first.starts_with("$argon2id$"));
        assert_ne!(first, "correct horse");
        assert_ne!(first, second);
    }

    #[test]
    fn test_verify_password() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_verify_password_unreadable_hash() {
        assert!(matches!(
            verify_password("anything", "plaintext"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_register_stores_hash_not_plaintext() {
        let store = MemoryUserStore::new();
        let user = AuthService::new(&store)
            .register(registration("grace@example.com", "cobol"))
            .await
            .unwrap();

        assert_eq!(user.name, "Grace Hopper");
        assert_eq!(user.email.as_str(), "grace@example.com");
        assert_ne!(user.password_hash, "cobol");
        assert!(verify_password("cobol", &user.password_hash).is_ok());
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let store = MemoryUserStore::new();
        let auth = AuthService::new(&store);
        auth.register(registration("grace@example.com", "cobol"))
            .await
            .unwrap();

        let err = auth
            .register(registration("grace@example.com", "fortran"))
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::UserAlreadyExists));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_register_insert_conflict_is_duplicate() {
        let err = AuthService::new(&LosingRaceUserStore)
            .register(registration("grace@example.com", "cobol"))
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::UserAlreadyExists));
    }

    #[tokio::test]
    async fn test_register_field_too_long() {
        let store = MemoryUserStore::new();
        let phone = "5".repeat(FIELD_LIMITS.phone + 1);
        let err = AuthService::new(&store)
            .register(Registration {
                phone: &phone,
                ..registration("grace@example.com", "cobol")
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AuthError::FieldTooLong {
                field: "phone",
                max: 20
            }
        ));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_register_empty_email() {
        let store = MemoryUserStore::new();
        let err = AuthService::new(&store)
            .register(registration("", "cobol"))
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::MissingField("email")));
    }

    #[tokio::test]
    async fn test_login() {
        let store = MemoryUserStore::new();
        let auth = AuthService::new(&store);
        let registered = auth
            .register(registration("grace@example.com", "cobol"))
            .await
            .unwrap();

        let user = auth.login("grace@example.com", "cobol").await.unwrap();
        assert_eq!(user.id, registered.id);
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let store = MemoryUserStore::new();
        let auth = AuthService::new(&store);
        auth.register(registration("grace@example.com", "cobol"))
            .await
            .unwrap();

        let wrong_password = auth.login("grace@example.com", "fortran").await;
        let unknown_email = auth.login("nobody@example.com", "cobol").await;
        let empty_email = auth.login("", "cobol").await;

        assert!(matches!(wrong_password, Err(AuthError::InvalidCredentials)));
        assert!(matches!(unknown_email, Err(AuthError::InvalidCredentials)));
        assert!(matches!(empty_email, Err(AuthError::InvalidCredentials)));
    }
}
