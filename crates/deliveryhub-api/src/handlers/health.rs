//! Health and stats handlers.

use axum::Json;
use axum::extract::State;

use deliveryhub_core::result::AppResult;
use deliveryhub_realtime::HubSnapshot;

use crate::dto::response::{ApiResponse, HealthResponse};
use crate::state::AppState;

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::ok(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
    }))
}

/// GET /api/stats
pub async fn stats(State(state): State<AppState>) -> AppResult<Json<ApiResponse<HubSnapshot>>> {
    let snapshot = state.hub.snapshot().await?;
    Ok(Json(ApiResponse::ok(snapshot)))
}
