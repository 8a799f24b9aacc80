use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use tracing::warn;

use crate::router::ExporterState;

pub async fn health_live() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn health_ready(State(state): State<Arc<ExporterState>>) -> impl IntoResponse {
    match state.device.show_hostname().await {
        Ok(_) => (StatusCode::OK, "ok"),
        Err(err) => {
            warn!(error = %err, unreachable = err.is_unreachable(), "readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "unable to communicate with node",
            )
        }
    }
}
