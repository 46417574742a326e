//! Session inspection and logout.

use super::shared_types::{bearer_token, ApiError};
use crate::app_state::AppState;
use crate::domain::SessionIdentity;
use axum::{extract::State, http::HeaderMap, Extension, Json};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct MeResponse {
    // ---
    pub user_id: Uuid,
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    // ---
    pub success: bool,
    /// Whether an authenticated session was bound to the token.
    pub terminated: bool,
}

/// GET /auth/me, behind `require_session`.
pub async fn me(Extension(identity): Extension<SessionIdentity>) -> Json<MeResponse> {
    Json(MeResponse {
        user_id: identity.user_id,
        username: identity.username,
    })
}

/// POST /auth/logout
///
/// Idempotent: logging out without a session still succeeds.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<LogoutResponse>, ApiError> {
    // ---
    let terminated = match bearer_token(&headers)? {
        Some(token) => state.service().terminate(&token).await?,
        None => false,
    };

    Ok(Json(LogoutResponse {
        success: true,
        terminated,
    }))
}
