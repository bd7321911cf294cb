//! Domain models for the portal.

pub mod session;
pub mod user;

pub use session::{CurrentUser, keys as session_keys};
pub use user::{FIELD_LIMITS, FieldLimits, NewUser, User};
