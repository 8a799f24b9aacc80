use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::router::ExporterState;

pub const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Always answers 200; collector failures only show up as missing samples
/// and in `eapi_scrape_collector_success`.
pub async fn prometheus_metrics(State(state): State<Arc<ExporterState>>) -> impl IntoResponse {
    let payload = state.registry.render_prometheus().await;

    let mut response = Response::new(Body::from(payload));
    *response.status_mut() = StatusCode::OK;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(PROMETHEUS_CONTENT_TYPE),
    );

    response
}
