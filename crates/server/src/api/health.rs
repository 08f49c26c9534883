use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::{AppState, SERVER_NAME, VERSION};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub server: &'static str,
    pub version: &'static str,
    pub mongodb_enabled: bool,
    pub mysql_enabled: bool,
    pub datadog_enabled: bool,
    pub timestamp: String,
}

/// Unauthenticated liveness probe with the live backend set.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let status = state.registry.status();
    Json(HealthResponse {
        status: "ok",
        server: SERVER_NAME,
        version: VERSION,
        mongodb_enabled: status.mongodb,
        mysql_enabled: status.mysql,
        datadog_enabled: status.datadog,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
