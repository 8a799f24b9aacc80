use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use eapi_client::{
    DeviceQuery, ShowEnvironmentPower, ShowHostname, ShowInterfaces, ShowVersion,
};
use eapi_common::error::{ExporterError, Result};

use crate::{collector::MetricSink, types::ConstMetric};

/// In-memory device. `None` makes the corresponding query fail.
#[derive(Default)]
pub struct FakeDevice {
    pub interfaces: Option<ShowInterfaces>,
    pub version: Option<ShowVersion>,
    pub power: Option<ShowEnvironmentPower>,
    pub queries: AtomicUsize,
}

impl FakeDevice {
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    fn answer<T: Clone>(&self, command: &str, value: &Option<T>) -> Result<T> {
        self.queries.fetch_add(1, Ordering::Relaxed);
        value
            .clone()
            .ok_or_else(|| ExporterError::Transport(format!("{command}: connection refused")))
    }
}

#[async_trait]
impl DeviceQuery for FakeDevice {
    async fn show_interfaces(&self) -> Result<ShowInterfaces> {
        self.answer(ShowInterfaces::COMMAND, &self.interfaces)
    }

    async fn show_version(&self) -> Result<ShowVersion> {
        self.answer(ShowVersion::COMMAND, &self.version)
    }

    async fn show_environment_power(&self) -> Result<ShowEnvironmentPower> {
        self.answer(ShowEnvironmentPower::COMMAND, &self.power)
    }

    async fn show_hostname(&self) -> Result<ShowHostname> {
        Ok(ShowHostname::default())
    }
}

pub fn find<'a>(sink: &'a MetricSink, name: &str, labels: &[(&str, &str)]) -> Option<&'a ConstMetric> {
    sink.metrics().iter().find(|metric| {
        metric.name() == name
            && labels
                .iter()
                .all(|(label, value)| metric.label(label) == Some(*value))
    })
}

pub fn value(sink: &MetricSink, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
    find(sink, name, labels).map(|metric| metric.value)
}

pub fn assert_label_arity(sink: &MetricSink) {
    for metric in sink.metrics() {
        assert_eq!(
            metric.label_values.len(),
            metric.descriptor.variable_labels.len(),
            "{}",
            metric.name()
        );
    }
}
