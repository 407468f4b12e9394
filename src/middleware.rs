//! Bearer-token auth middleware for the admin API.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::state::AppState;

/// The authenticated admin identity, inserted into request extensions.
#[derive(Clone)]
pub struct AdminContext {
    pub username: String,
}

/// Extract a Bearer token from the Authorization header.
///
/// Returns the token string without the "Bearer " prefix, or None if
/// the header is missing, malformed, or empty after the prefix.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
}

/// Reject requests without a valid, unexpired admin token.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer_token(request.headers()).ok_or(AppError::Unauthorized)?;
    let claims = state.tokens.verify(token)?;

    request.extensions_mut().insert(AdminContext {
        username: claims.username,
    });

    Ok(next.run(request).await)
}
