use axum::{extract::State, http::header, response::IntoResponse, Json};
use printqueue_core::SanitizedConfig;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use crate::metrics::{collect_dynamic_metrics, encode_metrics};
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

/// Prometheus text exposition.
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let store = Arc::clone(state.store());
    if let Err(e) = tokio::task::spawn_blocking(move || collect_dynamic_metrics(&store)).await {
        warn!("Failed to collect printer metrics: {}", e);
    }

    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}
