//! Account portal web application.
//!
//! A small server-rendered site where visitors register an account, log in
//! with email and password, see a protected dashboard, and log out. Each new
//! registration sends a best-effort notice to the site admin.
//!
//! # Architecture
//!
//! - Axum web framework with Askama templates
//! - `PostgreSQL` for users (sqlx) and sessions (tower-sessions)
//! - Argon2id password hashes
//! - SMTP notices via lettre, sent off the request path

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

pub use app::build_router;
pub use config::PortalConfig;
pub use state::AppState;
