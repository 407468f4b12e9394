mod auth;
mod keys;
mod software;
mod verify;

pub use auth::*;
pub use keys::*;
pub use software::*;
pub use verify::*;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Serialize;

use crate::middleware::require_auth;
use crate::state::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn router(state: AppState) -> Router<AppState> {
    // Public endpoints (no auth)
    let public = Router::new()
        .route("/health", get(health))
        .route("/api/login", post(login))
        .route("/api/verify-key", post(verify_key));

    // Admin endpoints (bearer token auth)
    let admin = Router::new()
        .route("/api/change-password", post(change_password))
        .route("/api/software", get(list_software))
        .route("/api/software", post(create_software))
        .route("/api/software/{id}", put(update_software))
        .route("/api/software/{id}", delete(delete_software))
        .route("/api/keys", get(list_keys))
        .route("/api/keys", post(generate_keys))
        .route("/api/keys/{id}", delete(delete_key))
        .layer(middleware::from_fn_with_state(state, require_auth));

    public.merge(admin)
}
