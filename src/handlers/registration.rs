//! Passkey registration handlers.
//!
//! Two-phase flow:
//! 1. `register_start` - issue a challenge and credential creation options
//! 2. `register_finish` - verify the attested credential and enroll the user

use super::shared_types::{bearer_token, require_token, ApiError};
use crate::app_state::AppState;
use crate::ceremony::{RegistrationOptions, RegistrationResponseJson};
use crate::codec;
use crate::domain::{RegistrationResponse, SessionToken};
use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RegistrationStartRequest {
    // ---
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct RegistrationStartResponse {
    // ---
    /// Session token the finish call must present.
    pub token: SessionToken,
    pub options: RegistrationOptions,
}

#[derive(Debug, Serialize)]
pub struct RegistrationFinishResponse {
    // ---
    pub success: bool,
    pub credential_id: String,
    pub user_id: Uuid,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/register/start
///
/// Reuses the bearer token when one is presented, otherwise mints one.
///
/// # Request Body
/// ```json
/// { "username": "alice" }
/// ```
pub async fn register_start(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RegistrationStartRequest>,
) -> Result<Json<RegistrationStartResponse>, ApiError> {
    // ---
    let token = bearer_token(&headers)?.unwrap_or_else(SessionToken::generate);

    let options = state
        .service()
        .begin_registration(&token, &req.username)
        .await?;

    Ok(Json(RegistrationStartResponse { token, options }))
}

/// POST /auth/register/finish
///
/// Body is the client's credential creation result with byte fields in
/// URL-safe base64.
pub async fn register_finish(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RegistrationResponseJson>,
) -> Result<(StatusCode, Json<RegistrationFinishResponse>), ApiError> {
    // ---
    let token = require_token(&headers)?;
    let response = RegistrationResponse::try_from(&req)?;

    let credential = state
        .service()
        .finish_registration(&token, &response)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegistrationFinishResponse {
            success: true,
            credential_id: codec::encode(&credential.id),
            user_id: credential.user_id,
        }),
    ))
}
