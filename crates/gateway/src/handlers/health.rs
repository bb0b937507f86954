//! Health check handlers

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub status: String,
    pub papers: usize,
    pub history_entries: usize,
}

/// Liveness probe - always returns healthy if server is running
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: examforge_core::VERSION.to_string(),
    })
}

/// Readiness probe - reports engine store sizes
pub async fn ready(State(state): State<AppState>) -> Json<ReadyResponse> {
    let stats = state.engine.stats().await;

    Json(ReadyResponse {
        status: "ready".to_string(),
        papers: stats.papers,
        history_entries: stats.history_entries,
    })
}

/// Prometheus metrics endpoint
pub async fn metrics(State(state): State<AppState>) -> String {
    state.prometheus.render()
}
