//! HTTP route handlers for the portal.
//!
//! # Route Structure
//!
//! ```text
//! GET  /               - Login form
//! GET  /register       - Registration form
//! POST /register       - Create account, then redirect to /
//! POST /login          - Authenticate, then redirect to /dashboard
//! GET  /dashboard      - Protected page (redirects to / without a session)
//! GET  /logout         - Clear session, redirect to / (POST also accepted)
//! GET  /health         - Liveness
//! GET  /health/ready   - Readiness (checks the user store)
//! ```

pub mod auth;
pub mod dashboard;
pub mod health;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Routes that use the session.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(auth::login_page))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", get(auth::logout).post(auth::logout))
        .route("/dashboard", get(dashboard::show))
}

/// Health check routes (no session).
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
}
