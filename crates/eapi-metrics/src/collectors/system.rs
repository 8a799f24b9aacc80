use std::sync::Arc;

use async_trait::async_trait;
use eapi_client::{DeviceQuery, PowerSupply};
use eapi_common::{error::Result, time};
use tracing::{debug, warn};

use crate::{
    collector::{Collector, MetricSink},
    collectors::bool_gauge,
    types::MetricDescriptor,
};

/// Boot time from `show version` and power supply state from
/// `show environment power`.
pub struct SystemCollector {
    device: Arc<dyn DeviceQuery>,

    boot_time: Arc<MetricDescriptor>,

    power_info: Arc<MetricDescriptor>,
    power_status: Arc<MetricDescriptor>,
    power_capacity_watts: Arc<MetricDescriptor>,
    power_input_amps: Arc<MetricDescriptor>,
    power_output_amps: Arc<MetricDescriptor>,
    power_output_watts: Arc<MetricDescriptor>,
    power_uptime: Arc<MetricDescriptor>,
    power_temp_celsius: Arc<MetricDescriptor>,
    power_fan_speed: Arc<MetricDescriptor>,
    power_fan_status: Arc<MetricDescriptor>,
}

impl SystemCollector {
    pub fn new(device: Arc<dyn DeviceQuery>) -> Self {
        Self {
            device,

            boot_time: MetricDescriptor::gauge(
                "node_boot_time_seconds",
                "Unix timestamp of system boot time.",
                &[],
            ),

            power_info: MetricDescriptor::gauge(
                "node_power_supply_info",
                "Power supply metadata.",
                &["supply", "model"],
            ),
            power_status: MetricDescriptor::gauge(
                "node_power_supply_status",
                "Power supply status, 1 if ok.",
                &["supply"],
            ),
            power_capacity_watts: MetricDescriptor::gauge(
                "node_power_supply_capacity_watts",
                "Power supply capacity in watts.",
                &["supply"],
            ),
            power_input_amps: MetricDescriptor::gauge(
                "node_power_supply_input_current_amperes",
                "Power supply input current in amperes.",
                &["supply"],
            ),
            power_output_amps: MetricDescriptor::gauge(
                "node_power_supply_output_current_amperes",
                "Power supply output current in amperes.",
                &["supply"],
            ),
            power_output_watts: MetricDescriptor::gauge(
                "node_power_supply_output_watts",
                "Power supply output power in watts.",
                &["supply"],
            ),
            power_uptime: MetricDescriptor::gauge(
                "node_power_supply_uptime_seconds",
                "Power supply uptime in seconds.",
                &["supply"],
            ),
            power_temp_celsius: MetricDescriptor::gauge(
                "node_power_supply_temp_celsius",
                "Power supply temperature in celsius.",
                &["supply", "sensor"],
            ),
            power_fan_speed: MetricDescriptor::gauge(
                "node_power_supply_fan_speed",
                "Power supply fan speed.",
                &["supply", "fan"],
            ),
            power_fan_status: MetricDescriptor::gauge(
                "node_power_supply_fan_status",
                "Power supply fan status, 1 if ok.",
                &["supply", "fan"],
            ),
        }
    }

    async fn collect_boot_time(&self, sink: &mut MetricSink) {
        let version = match self.device.show_version().await {
            Ok(version) => version,
            Err(err) => {
                warn!(error = %err, "failed to get version data");
                return;
            }
        };

        // Non-positive means the device did not report a boot time.
        if version.bootup_timestamp > 0.0 {
            if let Some(booted_at) = time::from_unix_seconds(version.bootup_timestamp) {
                debug!(booted_at = %time::format_rfc3339(&booted_at), "device boot time");
            }
            sink.emit(&self.boot_time, version.bootup_timestamp, &[]);
        }
    }

    fn emit_power_supply(&self, sink: &mut MetricSink, name: &str, psu: &PowerSupply) {
        let supply = &[name];

        sink.emit(&self.power_info, 1.0, &[name, psu.model_name.as_str()]);
        sink.emit(&self.power_status, bool_gauge(psu.is_ok()), supply);
        sink.emit(&self.power_capacity_watts, psu.capacity, supply);
        sink.emit(&self.power_input_amps, psu.input_current, supply);
        sink.emit(&self.power_output_amps, psu.output_current, supply);
        sink.emit(&self.power_output_watts, psu.output_power, supply);
        sink.emit(&self.power_uptime, psu.uptime, supply);

        for (sensor_name, sensor) in &psu.temp_sensors {
            sink.emit(
                &self.power_temp_celsius,
                sensor.temperature,
                &[name, sensor_name.as_str()],
            );
        }

        for (fan_name, fan) in &psu.fans {
            let labels = &[name, fan_name.as_str()];
            sink.emit(&self.power_fan_speed, fan.speed, labels);
            sink.emit(&self.power_fan_status, bool_gauge(fan.is_ok()), labels);
        }
    }
}

#[async_trait]
impl Collector for SystemCollector {
    fn name(&self) -> &'static str {
        "system"
    }

    fn describe(&self) -> Vec<Arc<MetricDescriptor>> {
        [
            &self.boot_time,
            &self.power_info,
            &self.power_status,
            &self.power_capacity_watts,
            &self.power_input_amps,
            &self.power_output_amps,
            &self.power_output_watts,
            &self.power_uptime,
            &self.power_temp_celsius,
            &self.power_fan_speed,
            &self.power_fan_status,
        ]
        .into_iter()
        .map(Arc::clone)
        .collect()
    }

    async fn collect(&self, sink: &mut MetricSink) -> Result<()> {
        self.collect_boot_time(sink).await;

        let power = self
            .device
            .show_environment_power()
            .await
            .inspect_err(|err| debug!(error = %err, "failed to get power data"))?;

        for (name, psu) in &power.power_supplies {
            self.emit_power_supply(sink, name, psu);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use eapi_client::{Fan, ShowEnvironmentPower, ShowVersion, TempSensor};

    use super::*;
    use crate::collectors::fake::{FakeDevice, assert_label_arity, find, value};

    fn version(bootup_timestamp: f64) -> Option<ShowVersion> {
        Some(ShowVersion {
            bootup_timestamp,
            ..ShowVersion::default()
        })
    }

    fn psu(state: &str) -> PowerSupply {
        PowerSupply {
            state: state.to_string(),
            model_name: "PWR-500AC-F".to_string(),
            capacity: 500.0,
            input_current: 0.56,
            output_current: 7.25,
            output_power: 87.0,
            uptime: 86_400.0,
            temp_sensors: BTreeMap::from([
                ("TempSensorP1/1".to_string(), TempSensor { status: "ok".to_string(), temperature: 29.5 }),
                ("TempSensorP1/2".to_string(), TempSensor { status: "ok".to_string(), temperature: 41.0 }),
            ]),
            fans: BTreeMap::from([
                ("FanP1/1".to_string(), Fan { status: "OK".to_string(), speed: 35.0 }),
                ("FanP1/2".to_string(), Fan { status: "failed".to_string(), speed: 0.0 }),
            ]),
        }
    }

    fn power(supplies: Vec<(&str, PowerSupply)>) -> Option<ShowEnvironmentPower> {
        Some(ShowEnvironmentPower {
            power_supplies: supplies
                .into_iter()
                .map(|(name, psu)| (name.to_string(), psu))
                .collect(),
        })
    }

    async fn collect(device: FakeDevice) -> (MetricSink, Result<()>) {
        let collector = SystemCollector::new(device.into_shared());
        let mut sink = MetricSink::new();
        let result = collector.collect(&mut sink).await;
        (sink, result)
    }

    #[test]
    fn describes_full_schema_without_device() {
        let collector = SystemCollector::new(FakeDevice::default().into_shared());
        let descriptors = collector.describe();

        assert_eq!(descriptors.len(), 11);
        assert!(descriptors.iter().all(|descriptor| descriptor.metric_type == crate::MetricType::Gauge));
        assert!(descriptors[0].variable_labels.is_empty());
    }

    #[tokio::test]
    async fn boot_time_only_when_positive() {
        for (timestamp, expected) in [
            (1_700_000_000.25, Some(1_700_000_000.25)),
            (0.0, None),
            (-5.0, None),
        ] {
            let (sink, _) = collect(FakeDevice {
                version: version(timestamp),
                power: power(Vec::new()),
                ..FakeDevice::default()
            })
            .await;

            assert_eq!(value(&sink, "node_boot_time_seconds", &[]), expected, "{timestamp}");
        }
    }

    #[tokio::test]
    async fn status_ignores_case() {
        let (sink, result) = collect(FakeDevice {
            version: version(0.0),
            power: power(vec![
                ("1", psu("ok")),
                ("2", psu("OK")),
                ("3", psu("Ok")),
                ("4", psu("powerLoss")),
                ("5", psu("")),
            ]),
            ..FakeDevice::default()
        })
        .await;
        result.unwrap();

        for supply in ["1", "2", "3"] {
            assert_eq!(value(&sink, "node_power_supply_status", &[("supply", supply)]), Some(1.0));
        }
        for supply in ["4", "5"] {
            assert_eq!(value(&sink, "node_power_supply_status", &[("supply", supply)]), Some(0.0));
        }
    }

    #[tokio::test]
    async fn maps_power_supply_fields() {
        let (sink, result) = collect(FakeDevice {
            version: version(1_700_000_000.0),
            power: power(vec![("1", psu("ok"))]),
            ..FakeDevice::default()
        })
        .await;
        result.unwrap();
        let supply = &[("supply", "1")];

        let info = find(&sink, "node_power_supply_info", supply).unwrap();
        assert_eq!(info.value, 1.0);
        assert_eq!(info.label("model"), Some("PWR-500AC-F"));

        assert_eq!(value(&sink, "node_power_supply_capacity_watts", supply), Some(500.0));
        assert_eq!(value(&sink, "node_power_supply_input_current_amperes", supply), Some(0.56));
        assert_eq!(value(&sink, "node_power_supply_output_current_amperes", supply), Some(7.25));
        assert_eq!(value(&sink, "node_power_supply_output_watts", supply), Some(87.0));
        assert_eq!(value(&sink, "node_power_supply_uptime_seconds", supply), Some(86_400.0));

        assert_eq!(
            value(&sink, "node_power_supply_temp_celsius", &[("supply", "1"), ("sensor", "TempSensorP1/2")]),
            Some(41.0)
        );
        assert_eq!(
            value(&sink, "node_power_supply_fan_speed", &[("supply", "1"), ("fan", "FanP1/1")]),
            Some(35.0)
        );
        assert_eq!(
            value(&sink, "node_power_supply_fan_status", &[("supply", "1"), ("fan", "FanP1/1")]),
            Some(1.0)
        );
        assert_eq!(
            value(&sink, "node_power_supply_fan_status", &[("supply", "1"), ("fan", "FanP1/2")]),
            Some(0.0)
        );

        // boot time + 7 per supply + 2 sensors + 2 fans * 2
        assert_eq!(sink.len(), 1 + 7 + 2 + 4);
        assert_label_arity(&sink);
    }

    #[tokio::test]
    async fn power_failure_keeps_boot_time() {
        let (sink, result) = collect(FakeDevice {
            version: version(1_700_000_000.0),
            power: None,
            ..FakeDevice::default()
        })
        .await;

        assert!(result.is_err());
        assert_eq!(sink.len(), 1);
        assert_eq!(value(&sink, "node_boot_time_seconds", &[]), Some(1_700_000_000.0));
        assert!(sink.metrics().iter().all(|metric| !metric.name().starts_with("node_power_supply")));
    }

    #[tokio::test]
    async fn version_failure_still_collects_power() {
        let (sink, result) = collect(FakeDevice {
            version: None,
            power: power(vec![("1", psu("ok"))]),
            ..FakeDevice::default()
        })
        .await;

        result.unwrap();
        assert_eq!(value(&sink, "node_boot_time_seconds", &[]), None);
        assert_eq!(value(&sink, "node_power_supply_status", &[("supply", "1")]), Some(1.0));
    }
}
