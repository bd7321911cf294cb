//! Router assembly.
//!
//! The binary and the integration tests build the same application here;
//! they only differ in the user store, notifier, and session store they
//! pass in.

use axum::{Router, body::Body, http::Request};
use tower_http::trace::TraceLayer;
use tower_sessions::SessionStore;

use crate::middleware::{request_id_middleware, security_headers_middleware, with_session_layer};
use crate::routes;
use crate::state::AppState;

/// Build the full application router.
///
/// Layers, outermost first: Sentry, tracing, request ID, security headers,
/// session (page routes only).
pub fn build_router<S>(state: AppState, session_store: S) -> Router
where
    S: SessionStore + Clone,
{
    let pages = with_session_layer(routes::routes(), session_store, state.config());

    Router::new()
        .merge(routes::health_routes())
        .merge(pages)
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}
