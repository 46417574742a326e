//! Passkey login handlers.
//!
//! 1. `login_start` - issue a challenge restricted to the user's credentials
//! 2. `login_finish` - verify the assertion and bind the session token

use super::shared_types::{bearer_token, require_token, ApiError};
use crate::app_state::AppState;
use crate::ceremony::{Assurance, AuthenticationOptions, AuthenticationResponseJson};
use crate::domain::{AuthenticationResponse, SessionToken};
use axum::{extract::State, http::HeaderMap, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginStartRequest {
    // ---
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct LoginStartResponse {
    // ---
    pub token: SessionToken,
    pub options: AuthenticationOptions,
}

#[derive(Debug, Serialize)]
pub struct LoginFinishResponse {
    // ---
    pub success: bool,
    pub user_id: Uuid,
    pub username: String,
    /// `counterless` when the authenticator does not keep a signature counter.
    pub assurance: Assurance,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/login/start
///
/// # Request Body
/// ```json
/// { "username": "alice" }
/// ```
pub async fn login_start(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<LoginStartRequest>,
) -> Result<Json<LoginStartResponse>, ApiError> {
    // ---
    let token = bearer_token(&headers)?.unwrap_or_else(SessionToken::generate);

    let options = state
        .service()
        .begin_authentication(&token, &req.username)
        .await?;

    Ok(Json(LoginStartResponse { token, options }))
}

/// POST /auth/login/finish
///
/// On success the bearer token becomes an authenticated session token.
pub async fn login_finish(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<AuthenticationResponseJson>,
) -> Result<Json<LoginFinishResponse>, ApiError> {
    // ---
    let token = require_token(&headers)?;
    let response = AuthenticationResponse::try_from(&req)?;

    let outcome = state
        .service()
        .finish_authentication(&token, &response)
        .await?;

    Ok(Json(LoginFinishResponse {
        success: true,
        user_id: outcome.identity.user_id,
        username: outcome.identity.username,
        assurance: outcome.identity.assurance,
    }))
}
