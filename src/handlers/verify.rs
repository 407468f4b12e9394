use axum::extract::State;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::extractors::Json;
use crate::models::Software;
use crate::registry::Validation;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct VerifyKeyRequest {
    pub code: String,
}

/// Outcome of a key check. Not-found and expired keys are reported as
/// `valid: false` in the body, not as HTTP errors.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyKeyResponse {
    pub valid: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expired: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_use: Option<bool>,
    /// Null for orphaned keys whose software entry is gone.
    pub software: Option<Software>,
    pub valid_until: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_used_at: Option<DateTime<Utc>>,
}

/// POST /api/verify-key (public)
pub async fn verify_key(
    State(state): State<AppState>,
    Json(req): Json<VerifyKeyRequest>,
) -> Result<Json<VerifyKeyResponse>> {
    if req.code.trim().is_empty() {
        return Err(AppError::BadRequest("A key code is required".into()));
    }

    let response = match state.registry.validate(&req.code)? {
        Validation::NotFound => VerifyKeyResponse {
            valid: false,
            message: "Key not found".into(),
            expired: None,
            first_use: None,
            software: None,
            valid_until: None,
            first_used_at: None,
        },
        Validation::Expired { valid_until } => VerifyKeyResponse {
            valid: false,
            message: "Key has expired".into(),
            expired: Some(true),
            first_use: None,
            software: None,
            valid_until: Some(valid_until),
            first_used_at: None,
        },
        Validation::Valid {
            first_use,
            first_used_at,
            valid_until,
            software,
        } => VerifyKeyResponse {
            valid: true,
            message: if first_use {
                "Key activated".into()
            } else {
                "Key is valid".into()
            },
            expired: None,
            first_use: Some(first_use),
            software,
            valid_until,
            first_used_at: Some(first_used_at),
        },
    };

    Ok(Json(response))
}
