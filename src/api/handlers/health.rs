use axum::{extract::State, response::IntoResponse, Json};
use crate::state::AppState;
use crate::api::dtos::responses::HealthResponse;
use std::sync::Arc;

pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let degraded_writes = state.monitor.stats();
    let database = if state.database_configured() { "configured" } else { "unconfigured" };
    let status = if state.database_configured() && degraded_writes.consecutive == 0 { "ok" } else { "degraded" };

    Json(HealthResponse { status, database, degraded_writes })
}
