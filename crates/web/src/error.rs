//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! The two expected form failures (duplicate email, bad credentials) are
//! answered with bare plain text and the default `200` status.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::services::auth::AuthError;

/// Body returned when registering an email that already has an account.
pub const EMAIL_TAKEN_MESSAGE: &str = "Email already registered!";

/// Body returned for any failed login.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid Credentials";

/// Application-level error type for the portal.
#[derive(Debug, Error)]
pub enum AppError {
    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Session store operation failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

impl AppError {
    fn is_server_error(&self) -> bool {
        match self {
            Self::Session(_) => true,
            Self::Auth(err) => matches!(err, AuthError::Repository(_) | AuthError::PasswordHash),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let (status, message) = match &self {
            Self::Auth(AuthError::UserAlreadyExists) => {
                (StatusCode::OK, EMAIL_TAKEN_MESSAGE.to_string())
            }
            Self::Auth(AuthError::InvalidCredentials) => {
                (StatusCode::OK, INVALID_CREDENTIALS_MESSAGE.to_string())
            }
            Self::Auth(err @ (AuthError::FieldTooLong { .. } | AuthError::MissingField(_))) => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            // Don't expose internal error details to clients
            Self::Session(_)
            | Self::Auth(AuthError::Repository(_) | AuthError::PasswordHash) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
