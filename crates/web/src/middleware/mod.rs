//! HTTP middleware stack for the portal.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers (CSP, framing, referrer)
//! 5. Session layer (tower-sessions, signed cookie)

pub mod auth;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{RequireAuth, clear_session, set_current_user};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::{SESSION_COOKIE_NAME, with_session_layer};
