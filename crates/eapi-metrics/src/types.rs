use std::sync::Arc;

use eapi_common::error::{ExporterError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Counter,
    Gauge,
}

impl MetricType {
    pub fn as_prometheus_type(&self) -> &'static str {
        match self {
            Self::Counter => "counter",
            Self::Gauge => "gauge",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricDescriptor {
    pub name: String,
    pub help: String,
    pub metric_type: MetricType,
    pub variable_labels: Vec<String>,
}

impl MetricDescriptor {
    pub fn new(name: &str, help: &str, metric_type: MetricType, variable_labels: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            help: help.to_string(),
            metric_type,
            variable_labels: variable_labels.iter().map(|label| (*label).to_string()).collect(),
        }
    }

    pub fn gauge(name: &str, help: &str, variable_labels: &[&str]) -> Arc<Self> {
        Arc::new(Self::new(name, help, MetricType::Gauge, variable_labels))
    }

    pub fn counter(name: &str, help: &str, variable_labels: &[&str]) -> Arc<Self> {
        Arc::new(Self::new(name, help, MetricType::Counter, variable_labels))
    }
}

/// A single observation produced during a scrape.
#[derive(Debug, Clone)]
pub struct ConstMetric {
    pub descriptor: Arc<MetricDescriptor>,
    pub value: f64,
    pub label_values: Vec<String>,
}

impl ConstMetric {
    /// Fails when the number of label values differs from the descriptor's
    /// label names.
    pub fn new(descriptor: &Arc<MetricDescriptor>, value: f64, label_values: &[&str]) -> Result<Self> {
        if label_values.len() != descriptor.variable_labels.len() {
            return Err(ExporterError::InvalidArgument(format!(
                "metric {} expects {} label values, got {}",
                descriptor.name,
                descriptor.variable_labels.len(),
                label_values.len()
            )));
        }

        Ok(Self {
            descriptor: Arc::clone(descriptor),
            value,
            label_values: label_values.iter().map(|value| (*value).to_string()).collect(),
        })
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn label(&self, name: &str) -> Option<&str> {
        self.descriptor
            .variable_labels
            .iter()
            .position(|label| label == name)
            .and_then(|index| self.label_values.get(index))
            .map(String::as_str)
    }

    pub fn labels(&self) -> Vec<(String, String)> {
        self.descriptor
            .variable_labels
            .iter()
            .zip(self.label_values.iter())
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct CollectedMetric {
    pub descriptor: Arc<MetricDescriptor>,
    pub samples: Vec<ConstMetric>,
}
