use axum::extract::State;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::crypto::{hash_password, verify_password};
use crate::error::{AppError, Result};
use crate::extractors::Json;
use crate::models::AdminUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

/// POST /api/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    if req.username.is_empty() || req.password.is_empty() {
        return Err(AppError::BadRequest(
            "Username and password are required".into(),
        ));
    }

    let admin = state.users.get()?.ok_or(AppError::Unauthorized)?;

    if admin.username != req.username || !verify_password(&req.password, &admin.password_hash) {
        tracing::warn!("Failed login attempt for user {}", req.username);
        return Err(AppError::Unauthorized);
    }

    let token = state.tokens.issue(&admin.username)?;
    Ok(Json(LoginResponse { token }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// POST /api/change-password
pub async fn change_password(
    State(state): State<AppState>,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>> {
    if req.current_password.is_empty() || req.new_password.is_empty() {
        return Err(AppError::BadRequest(
            "Current and new password are required".into(),
        ));
    }
    if req.new_password.len() < 6 {
        return Err(AppError::BadRequest(
            "New password must be at least 6 characters".into(),
        ));
    }

    let admin = state.users.get()?.ok_or(AppError::Unauthorized)?;

    if !verify_password(&req.current_password, &admin.password_hash) {
        return Err(AppError::Unauthorized);
    }

    state.users.save(&AdminUser {
        username: admin.username,
        password_hash: hash_password(&req.new_password),
        updated_at: Utc::now(),
    })?;

    Ok(Json(MessageResponse {
        message: "Password updated".into(),
    }))
}
