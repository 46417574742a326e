//! Types and helpers shared by the ceremony handlers.

use crate::domain::{CeremonyError, ErrorCategory, SessionToken};
use axum::{
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

// ============================================================================
// Error responses
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    // ---
    pub error: String,
    /// Error category, e.g. `ceremony_state`.
    pub kind: &'static str,
}

/// Error returned by every handler.
///
/// Wraps a [`CeremonyError`] and renders it with the status its category
/// calls for. Verification failures render one generic message.
#[derive(Debug)]
pub enum ApiError {
    Ceremony(CeremonyError),
    Unauthorized(&'static str),
}

impl From<CeremonyError> for ApiError {
    fn from(err: CeremonyError) -> Self {
        ApiError::Ceremony(err)
    }
}

fn status_for(err: &CeremonyError) -> StatusCode {
    // ---
    match err.category() {
        _ if matches!(err, CeremonyError::UnknownUser) => StatusCode::NOT_FOUND,
        ErrorCategory::ClientInput | ErrorCategory::CeremonyState => StatusCode::BAD_REQUEST,
        ErrorCategory::Conflict => StatusCode::CONFLICT,
        ErrorCategory::Verification => StatusCode::UNAUTHORIZED,
        ErrorCategory::SecurityInvariant => StatusCode::FORBIDDEN,
        ErrorCategory::Persistence => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // ---
        match self {
            ApiError::Ceremony(err) => {
                let status = status_for(&err);
                if status.is_server_error() {
                    tracing::error!("Ceremony failed: {:?}", err);
                } else {
                    tracing::warn!("Ceremony rejected: {}", err);
                }

                let body = ErrorResponse {
                    error: err.public_message(),
                    kind: err.category().as_str(),
                };
                (status, Json(body)).into_response()
            }
            ApiError::Unauthorized(reason) => {
                tracing::debug!("Unauthorized: {}", reason);
                let body = ErrorResponse {
                    error: reason.to_string(),
                    kind: "unauthorized",
                };
                (StatusCode::UNAUTHORIZED, Json(body)).into_response()
            }
        }
    }
}

// ============================================================================
// Session token transport
// ============================================================================

/// Reads the session token from `Authorization: Bearer <token>`.
///
/// Returns `Ok(None)` when the header is absent and an error when it is
/// present but malformed.
pub fn bearer_token(headers: &HeaderMap) -> Result<Option<SessionToken>, ApiError> {
    // ---
    let Some(value) = headers.get("authorization") else {
        return Ok(None);
    };

    let value = value
        .to_str()
        .map_err(|_| ApiError::Unauthorized("Invalid Authorization header"))?;

    let token = value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(ApiError::Unauthorized("Invalid Authorization header format"))?;

    Ok(Some(SessionToken::from(token)))
}

/// Like [`bearer_token`] but a missing header is an error.
pub fn require_token(headers: &HeaderMap) -> Result<SessionToken, ApiError> {
    bearer_token(headers)?.ok_or(ApiError::Unauthorized("Missing Authorization header"))
}
