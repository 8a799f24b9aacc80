pub mod collector;
pub mod collectors;
pub mod registry;
pub mod types;

pub use collector::{Collector, MetricSink};
pub use collectors::{interface::InterfaceCollector, system::SystemCollector};
pub use registry::{MetricsRegistry, render_prometheus};
pub use types::{CollectedMetric, ConstMetric, MetricDescriptor, MetricType};
