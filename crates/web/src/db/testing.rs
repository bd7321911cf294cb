//! Store doubles for unit tests.

use async_trait::async_trait;

use portal_core::Email;

use super::{RepositoryError, UserStore};
use crate::models::{NewUser, User};

/// Store that loses every registration race: lookups see nobody, and the
/// insert then hits the unique constraint.
pub struct LosingRaceUserStore;

#[async_trait]
impl UserStore for LosingRaceUserStore {
    async fn find_by_email(&self, _email: &Email) -> Result<Option<User>, RepositoryError> {
        Ok(None)
    }

    async fn insert(&self, _user: &NewUser) -> Result<User, RepositoryError> {
        Err(RepositoryError::Conflict("email already exists".to_owned()))
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
