use crate::domain::SessionIdentity;
use axum::{Extension, Json};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    // ---
    pub message: String,
    pub username: String,
}

/// GET /api/dashboard-data
///
/// Sample resource only reachable through `require_session`.
pub async fn dashboard_data(
    Extension(identity): Extension<SessionIdentity>,
) -> Json<DashboardResponse> {
    // ---
    tracing::debug!("Dashboard data served to '{}'", identity.username);
    Json(DashboardResponse {
        message: format!("Welcome back, {}", identity.username),
        username: identity.username,
    })
}
