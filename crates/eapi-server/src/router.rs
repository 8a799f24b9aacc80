use std::sync::Arc;

use axum::{Router, routing::get};
use eapi_client::DeviceQuery;
use eapi_common::error::Result;
use eapi_metrics::{InterfaceCollector, MetricsRegistry, SystemCollector};

use crate::handlers;

pub struct ExporterState {
    pub device: Arc<dyn DeviceQuery>,
    pub registry: Arc<MetricsRegistry>,
}

impl ExporterState {
    pub fn new(device: Arc<dyn DeviceQuery>) -> Result<Self> {
        let registry = Arc::new(MetricsRegistry::new());
        registry.register(Arc::new(InterfaceCollector::new(Arc::clone(&device))))?;
        registry.register(Arc::new(SystemCollector::new(Arc::clone(&device))))?;

        Ok(Self { device, registry })
    }
}

pub fn exporter_router(state: Arc<ExporterState>) -> Router {
    Router::new()
        .route("/metrics", get(handlers::metrics::prometheus_metrics))
        .route("/health", get(handlers::health::health_live))
        .route("/ready", get(handlers::health::health_ready))
        .with_state(state)
}
