use std::sync::Arc;

use async_trait::async_trait;
use eapi_common::error::Result;
use tracing::error;

use crate::types::{ConstMetric, MetricDescriptor};

/// A source of metrics that is queried on every scrape.
///
/// `describe` must return the full schema without touching the device, so it
/// stays available while the device is unreachable. `collect` writes samples
/// into the sink as it goes; anything written before an error is kept.
#[async_trait]
pub trait Collector: Send + Sync {
    fn name(&self) -> &'static str;

    fn describe(&self) -> Vec<Arc<MetricDescriptor>>;

    async fn collect(&self, sink: &mut MetricSink) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MetricSink {
    metrics: Vec<ConstMetric>,
}

impl MetricSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Samples with the wrong number of label values are dropped and logged
    /// instead of reaching the output.
    pub fn emit(&mut self, descriptor: &Arc<MetricDescriptor>, value: f64, label_values: &[&str]) {
        match ConstMetric::new(descriptor, value, label_values) {
            Ok(metric) => self.metrics.push(metric),
            Err(err) => error!(metric = %descriptor.name, error = %err, "dropping invalid sample"),
        }
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn metrics(&self) -> &[ConstMetric] {
        &self.metrics
    }

    pub fn into_metrics(self) -> Vec<ConstMetric> {
        self.metrics
    }
}
