//! Protected dashboard.

use askama::Template;
use askama_web::WebTemplate;
use axum::response::IntoResponse;

use crate::middleware::RequireAuth;

/// Dashboard page template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub name: String,
}

/// Render the dashboard for a logged-in user.
///
/// Nothing is loaded from the database; the name comes from the session.
pub async fn show(RequireAuth(user): RequireAuth) -> impl IntoResponse {
    DashboardTemplate { name: user.name }
}
