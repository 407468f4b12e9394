use axum::extract::State;

use crate::error::Result;
use crate::extractors::{Json, Path};
use crate::handlers::MessageResponse;
use crate::models::{CreateSoftware, Software};
use crate::state::AppState;

/// GET /api/software
pub async fn list_software(State(state): State<AppState>) -> Result<Json<Vec<Software>>> {
    Ok(Json(state.catalog.list()?))
}

/// POST /api/software
pub async fn create_software(
    State(state): State<AppState>,
    Json(body): Json<CreateSoftware>,
) -> Result<Json<Software>> {
    let software = state.catalog.create(body)?;
    tracing::info!("Created software {} ({})", software.name, software.id);
    Ok(Json(software))
}

/// PUT /api/software/{id}
pub async fn update_software(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<CreateSoftware>,
) -> Result<Json<Software>> {
    Ok(Json(state.catalog.update(&id, body)?))
}

/// DELETE /api/software/{id}
pub async fn delete_software(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    state.catalog.delete(&id)?;
    Ok(Json(MessageResponse {
        message: "Software deleted".into(),
    }))
}
