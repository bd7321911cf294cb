//! Authentication route handlers.
//!
//! Handles the login and registration forms, login, and logout. Failures
//! the user can cause are answered as plain text (see [`crate::error`]).

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{clear_session, set_current_user};
use crate::models::{CurrentUser, FIELD_LIMITS, FieldLimits};
use crate::services::auth::{AuthError, AuthService, Registration};
use crate::services::notify::RegistrationNotice;
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration form data. Every field is required.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub password: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub email_max: usize,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub limits: FieldLimits,
}

// =============================================================================
// Pages
// =============================================================================

/// Display the login form.
pub async fn login_page() -> impl IntoResponse {
    LoginTemplate {
        email_max: FIELD_LIMITS.email,
    }
}

/// Display the registration form.
pub async fn register_page() -> impl IntoResponse {
    RegisterTemplate {
        limits: FIELD_LIMITS,
    }
}

// =============================================================================
// Actions
// =============================================================================

/// Handle registration form submission.
///
/// On success the admin notice is dispatched in the background and the
/// browser is sent back to the login form. The notice outcome never changes
/// the response.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> Result<Redirect> {
    let user = AuthService::new(state.users())
        .register(Registration {
            name: &form.name,
            address: &form.address,
            phone: &form.phone,
            email: &form.email,
            password: &form.password,
        })
        .await
        .inspect_err(|e| {
            if matches!(e, AuthError::UserAlreadyExists) {
                tracing::info!(email = %form.email, "Registration rejected: email already registered");
            }
        })?;

    tracing::info!(user_id = %user.id, email = %user.email, "User registered");

    state
        .notifications()
        .dispatch(RegistrationNotice::from(&user));

    Ok(Redirect::to("/"))
}

/// Handle login form submission.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Redirect> {
    let user = AuthService::new(state.users())
        .login(&form.email, &form.password)
        .await
        .inspect_err(|e| {
            if matches!(e, AuthError::InvalidCredentials) {
                tracing::info!(email = %form.email, "Login failed");
            }
        })?;

    set_current_user(
        &session,
        &CurrentUser {
            id: user.id,
            name: user.name.clone(),
        },
    )
    .await?;
    set_sentry_user(&user.id);

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Redirect::to("/dashboard"))
}

/// Handle logout.
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_session(&session).await?;
    clear_sentry_user();

    Ok(Redirect::to("/"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode, header::CONTENT_TYPE},
    };
    use secrecy::SecretString;
    use tower::ServiceExt;
    use tower_sessions::MemoryStore;

    use crate::app::build_router;
    use crate::config::PortalConfig;
    use crate::db::testing::LosingRaceUserStore;
    use crate::services::notify::NotificationService;

    use super::*;

    fn test_state() -> AppState {
        let config = PortalConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 5000,
            base_url: "http://localhost:5000".to_string(),
            secret_key: SecretString::from("k9$Tq2!vX7@pL4#zR8&wN1*mB6^cF3%h"),
            email: None,
            sentry_dsn: None,
            sentry_environment: None,
        };
        AppState::new(
            config,
            Arc::new(LosingRaceUserStore),
            NotificationService::from_config(None),
        )
    }

    #[tokio::test]
    async fn test_register_race_answers_email_taken() {
        let app = build_router(test_state(), MemoryStore::default());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/register")
                    .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(
                        "name=Grace&address=1+Compiler+Rd&phone=555-0199\
                         &email=grace%40example.com&password=cobol",
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(body, "Email already registered!".as_bytes());
    }
}
