//! Session middleware configuration.
//!
//! Sessions live server-side in a tower-sessions store; the browser only
//! holds a signed session-id cookie. The signing key is derived from
//! `PORTAL_SECRET_KEY` and is the only process-wide session value.

use axum::Router;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha512};
use tower_sessions::cookie::{Key, SameSite, time::Duration};
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};

use crate::config::PortalConfig;
use crate::state::AppState;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "portal_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Derive the 64-byte cookie signing key from the configured secret.
#[must_use]
pub fn signing_key(secret: &SecretString) -> Key {
    let digest = Sha512::digest(secret.expose_secret().as_bytes());
    Key::from(digest.as_slice())
}

/// Wrap `router` in a session layer backed by `store`.
///
/// # Arguments
///
/// * `router` - Routes that need a [`tower_sessions::Session`]
/// * `store` - Session store (`PostgreSQL` in production, memory in tests)
/// * `config` - Portal configuration (secret key, base URL)
pub fn with_session_layer<S>(
    router: Router<AppState>,
    store: S,
    config: &PortalConfig,
) -> Router<AppState>
where
    S: SessionStore + Clone,
{
    let layer = SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(Duration::seconds(
            SESSION_EXPIRY_SECONDS,
        )))
        .with_secure(config.is_secure())
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
        .with_signed(signing_key(&config.secret_key));

    router.layer(layer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signing_key_is_deterministic() {
        let secret = SecretString::from("k9$Tq2!vX7@pL4#zR8&wN1*mB6^cF3%h");
        let first = signing_key(&secret);
        let second = signing_key(&secret);
        assert_eq!(first.master(), second.master());
        assert_eq!(first.master().len(), 64);
    }

    #[test]
    fn test_signing_key_depends_on_secret() {
        let a = signing_key(&SecretString::from("k9$Tq2!vX7@pL4#zR8&wN1*mB6^cF3%h"));
        let b = signing_key(&SecretString::from("Z4&gH8!qW2@eR6#tY0*uI5^oP9%aS1$d"));
        assert_ne!(a.master(), b.master());
    }
}
