//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::types::ApiContext;
use crate::engine::HealthStatus;

#[derive(Serialize)]
pub struct HealthResponse {
    #[serde(flatten)]
    pub engine: HealthStatus,
    pub version: &'static str,
}

/// `GET /api/health` — reports whether the encoding table and model
/// artifact loaded, plus the versions in service.
pub async fn check(State(ctx): State<ApiContext>) -> Json<HealthResponse> {
    Json(HealthResponse {
        engine: ctx.engine.health(),
        version: crate::config::APP_VERSION,
    })
}
