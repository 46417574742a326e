//! Route protection for endpoints that need an authenticated session.

use super::shared_types::{require_token, ApiError};
use crate::app_state::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};

const NO_STORE: &str = "no-store, no-cache, must-revalidate, private";

/// Rejects requests without a live session with 401.
///
/// On success the [`SessionIdentity`](crate::domain::SessionIdentity) is
/// placed in the request extensions and the response is marked uncacheable.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // ---
    let token = require_token(request.headers())?;

    let identity = state
        .service()
        .current_identity(&token)
        .await?
        .ok_or(ApiError::Unauthorized("Not authenticated"))?;

    tracing::debug!("Session for '{}' admitted", identity.username);
    request.extensions_mut().insert(identity);

    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(NO_STORE));
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::EXPIRES, HeaderValue::from_static("0"));
    Ok(response)
}
