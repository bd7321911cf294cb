//! Business logic services for the portal.
//!
//! # Services
//!
//! - `auth` - Registration and password login
//! - `notify` - Best-effort admin notification on registration

pub mod auth;
pub mod notify;
