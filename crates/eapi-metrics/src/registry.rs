use std::{
    collections::{BTreeMap, HashSet},
    fmt::Write as _,
    sync::{Arc, RwLock},
    time::Instant,
};

use eapi_common::error::{ExporterError, Result};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::{
    collector::{Collector, MetricSink},
    types::{CollectedMetric, ConstMetric, MetricDescriptor},
};

/// Holds the registered collectors and runs them on each scrape.
///
/// Scrapes are serialized: a second scrape waits until the first one has
/// finished querying the device, so a slow device never sees more than one
/// set of collection queries at a time.
pub struct MetricsRegistry {
    collectors: RwLock<Vec<Arc<dyn Collector>>>,
    scrape_lock: Mutex<()>,
    scrape_duration: Arc<MetricDescriptor>,
    scrape_success: Arc<MetricDescriptor>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self {
            collectors: RwLock::new(Vec::new()),
            scrape_lock: Mutex::new(()),
            scrape_duration: MetricDescriptor::gauge(
                "eapi_scrape_collector_duration_seconds",
                "Duration of a collector scrape.",
                &["collector"],
            ),
            scrape_success: MetricDescriptor::gauge(
                "eapi_scrape_collector_success",
                "Whether a collector succeeded.",
                &["collector"],
            ),
        }
    }

    pub fn register(&self, collector: Arc<dyn Collector>) -> Result<()> {
        let mut collectors = self.collectors.write().map_err(|_| {
            ExporterError::InternalError("failed to acquire metrics registry lock".to_string())
        })?;

        if collectors.iter().any(|existing| existing.name() == collector.name()) {
            return Err(ExporterError::InvalidArgument(format!(
                "collector already registered: {}",
                collector.name()
            )));
        }

        let mut known: HashSet<String> = collectors
            .iter()
            .flat_map(|existing| existing.describe())
            .chain(self.own_descriptors())
            .map(|descriptor| descriptor.name.clone())
            .collect();

        for descriptor in collector.describe() {
            if !known.insert(descriptor.name.clone()) {
                return Err(ExporterError::InvalidArgument(format!(
                    "metric already registered: {}",
                    descriptor.name
                )));
            }
        }

        collectors.push(collector);
        Ok(())
    }

    /// The schema of every registered collector plus the registry's own
    /// scrape metrics. Never contacts the device.
    pub fn describe_all(&self) -> Vec<Arc<MetricDescriptor>> {
        let mut descriptors: Vec<_> = self
            .collectors_snapshot()
            .iter()
            .flat_map(|collector| collector.describe())
            .collect();
        descriptors.extend(self.own_descriptors());
        descriptors
    }

    pub async fn gather(&self) -> Vec<CollectedMetric> {
        let _scrape = self.scrape_lock.lock().await;

        let mut metrics: Vec<ConstMetric> = Vec::new();
        let mut scrape_sink = MetricSink::new();

        for collector in self.collectors_snapshot() {
            let name = collector.name();
            let started_at = Instant::now();
            let mut sink = MetricSink::new();

            let success = match collector.collect(&mut sink).await {
                Ok(()) => true,
                Err(err) => {
                    warn!(
                        collector = name,
                        error = %err,
                        kind = err.kind(),
                        unreachable = err.is_unreachable(),
                        "collector failed"
                    );
                    false
                }
            };
            let elapsed = started_at.elapsed();

            debug!(
                collector = name,
                samples = sink.len(),
                elapsed_ms = elapsed.as_millis() as u64,
                success,
                "collector finished"
            );

            scrape_sink.emit(&self.scrape_duration, elapsed.as_secs_f64(), &[name]);
            scrape_sink.emit(&self.scrape_success, if success { 1.0 } else { 0.0 }, &[name]);
            metrics.extend(sink.into_metrics());
        }

        metrics.extend(scrape_sink.into_metrics());
        group_by_family(metrics)
    }

    pub async fn render_prometheus(&self) -> String {
        render_prometheus(&self.gather().await)
    }

    fn own_descriptors(&self) -> [Arc<MetricDescriptor>; 2] {
        [
            Arc::clone(&self.scrape_duration),
            Arc::clone(&self.scrape_success),
        ]
    }

    fn collectors_snapshot(&self) -> Vec<Arc<dyn Collector>> {
        // The list is only ever pushed to, so a panic elsewhere cannot leave
        // it half-written.
        self.collectors
            .read()
            .unwrap_or_else(|poisoned| {
                warn!("metrics registry lock poisoned, recovering");
                poisoned.into_inner()
            })
            .clone()
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn group_by_family(metrics: Vec<ConstMetric>) -> Vec<CollectedMetric> {
    let mut families: BTreeMap<String, CollectedMetric> = BTreeMap::new();
    for metric in metrics {
        families
            .entry(metric.descriptor.name.clone())
            .or_insert_with(|| CollectedMetric {
                descriptor: Arc::clone(&metric.descriptor),
                samples: Vec::new(),
            })
            .samples
            .push(metric);
    }
    families.into_values().collect()
}

/// Renders collected metrics in the Prometheus text exposition format.
/// Families without samples are omitted.
pub fn render_prometheus(metrics: &[CollectedMetric]) -> String {
    let mut output = String::new();

    for metric in metrics.iter().filter(|metric| !metric.samples.is_empty()) {
        let _ = writeln!(
            output,
            "# HELP {} {}",
            metric.descriptor.name,
            escape_help(&metric.descriptor.help)
        );
        let _ = writeln!(
            output,
            "# TYPE {} {}",
            metric.descriptor.name,
            metric.descriptor.metric_type.as_prometheus_type()
        );

        for sample in &metric.samples {
            output.push_str(&render_sample_line(
                &metric.descriptor.name,
                &sample.labels(),
                sample.value,
            ));
        }
    }

    output
}

fn render_sample_line(name: &str, labels: &[(String, String)], value: f64) -> String {
    let mut rendered = String::new();
    rendered.push_str(name);

    if !labels.is_empty() {
        rendered.push('{');
        for (index, (key, value)) in labels.iter().enumerate() {
            if index > 0 {
                rendered.push(',');
            }
            rendered.push_str(key);
            rendered.push_str("=\"");
            rendered.push_str(&escape_label_value(value));
            rendered.push('"');
        }
        rendered.push('}');
    }

    rendered.push(' ');
    rendered.push_str(&format_metric_value(value));
    rendered.push('\n');
    rendered
}

fn format_metric_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value.is_sign_positive() { "+Inf" } else { "-Inf" }.to_string()
    } else if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

fn escape_help(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\n', "\\n")
}

fn escape_label_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace('"', "\\\"")
}
