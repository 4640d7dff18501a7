use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::metrics::encode_metrics;
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub wrapper: String,
    pub acestep: String,
    pub acestep_url: String,
}

/// Liveness of the wrapper plus reachability of the backend. Always 200.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let acestep = if state.backend().is_healthy().await {
        "ok"
    } else {
        "unreachable"
    };

    Json(HealthResponse {
        wrapper: "ok".to_string(),
        acestep: acestep.to_string(),
        acestep_url: state.backend_url().to_string(),
    })
}

pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}
