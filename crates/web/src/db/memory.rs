//! In-process user store.
//!
//! Behaves like the `users` table (sequential IDs, unique email) without a
//! database. Used by the HTTP tests and for local experiments.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use portal_core::{Email, UserId};

use super::{RepositoryError, UserStore};
use crate::models::{NewUser, User};

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    next_id: i32,
}

/// User store kept in memory.
#[derive(Default)]
pub struct MemoryUserStore {
    inner: Mutex<Inner>,
}

impl MemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored user, in insertion order.
    #[must_use]
    pub fn all(&self) -> Vec<User> {
        self.lock().users.clone()
    }

    /// Number of stored users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().users.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .lock()
            .users
            .iter()
            .find(|user| &user.email == email)
            .cloned())
    }

    async fn insert(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let mut inner = self.lock();

        if inner.users.iter().any(|existing| existing.email == user.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        inner.next_id += 1;
        let created = User {
            id: UserId::new(inner.next_id),
            name: user.name.clone(),
            address: user.address.clone(),
            phone: user.phone.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            created_at: Utc::now(),
        };
        inner.users.push(created.clone());

        Ok(created)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Ada".to_string(),
            address: "1 Analytical Way".to_string(),
            phone: "555-0100".to_string(),
            email: Email::parse(email).unwrap(),
            password_hash: "$argon2id$stub".to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids() {
        let store = MemoryUserStore::new();
        let first = store.insert(&new_user("a@example.com")).await.unwrap();
        let second = store.insert(&new_user("b@example.com")).await.unwrap();

        assert_eq!(first.id, UserId::new(1));
        assert_eq!(second.id, UserId::new(2));
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_email() {
        let store = MemoryUserStore::new();
        store.insert(&new_user("a@example.com")).await.unwrap();

        let err = store.insert(&new_user("a@example.com")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_find_by_email_is_exact() {
        let store = MemoryUserStore::new();
        store.insert(&new_user("a@example.com")).await.unwrap();

        let found = store
            .find_by_email(&Email::parse("a@example.com").unwrap())
            .await
            .unwrap();
        assert_eq!(found.unwrap().name, "Ada");

        let missing = store
            .find_by_email(&Email::parse("A@example.com").unwrap())
            .await
            .unwrap();
        assert!(missing.is_none());
    }
}
