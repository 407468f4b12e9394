use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::extractors::{Json, Path};
use crate::handlers::MessageResponse;
use crate::models::{Key, KeyWithSoftware};
use crate::state::AppState;

/// GET /api/keys
pub async fn list_keys(State(state): State<AppState>) -> Result<Json<Vec<KeyWithSoftware>>> {
    Ok(Json(state.registry.list()?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateKeysRequest {
    pub software_id: String,
    pub count: i64,
    /// Days until expiry; absent or 0 means the keys never expire.
    #[serde(default)]
    pub validity_days: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct GenerateKeysResponse {
    pub keys: Vec<Key>,
}

/// POST /api/keys
pub async fn generate_keys(
    State(state): State<AppState>,
    Json(body): Json<GenerateKeysRequest>,
) -> Result<Json<GenerateKeysResponse>> {
    let keys = state
        .registry
        .generate(&body.software_id, body.count, body.validity_days)?;
    tracing::info!(
        "Generated {} keys for software {}",
        keys.len(),
        body.software_id
    );
    Ok(Json(GenerateKeysResponse { keys }))
}

/// DELETE /api/keys/{id}
pub async fn delete_key(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    state.registry.delete(&id)?;
    Ok(Json(MessageResponse {
        message: "Key deleted".into(),
    }))
}
