use std::sync::Arc;

use async_trait::async_trait;
use eapi_client::{DeviceQuery, Interface};
use eapi_common::error::Result;
use tracing::debug;

use crate::{
    collector::{Collector, MetricSink},
    collectors::bool_gauge,
    types::MetricDescriptor,
};

/// Per-interface link, traffic and error metrics from `show interfaces`.
pub struct InterfaceCollector {
    device: Arc<dyn DeviceQuery>,

    // Gauges
    up: Arc<MetricDescriptor>,
    info: Arc<MetricDescriptor>,
    mtu_bytes: Arc<MetricDescriptor>,
    speed_bytes: Arc<MetricDescriptor>,

    // Counters
    receive_bytes: Arc<MetricDescriptor>,
    transmit_bytes: Arc<MetricDescriptor>,
    receive_packets: Arc<MetricDescriptor>,
    transmit_packets: Arc<MetricDescriptor>,
    receive_errs: Arc<MetricDescriptor>,
    transmit_errs: Arc<MetricDescriptor>,
    receive_drop: Arc<MetricDescriptor>,
    transmit_drop: Arc<MetricDescriptor>,
    receive_multicast: Arc<MetricDescriptor>,
    receive_broadcast: Arc<MetricDescriptor>,
    transmit_multicast: Arc<MetricDescriptor>,
    transmit_broadcast: Arc<MetricDescriptor>,
    carrier_changes: Arc<MetricDescriptor>,
}

impl InterfaceCollector {
    pub fn new(device: Arc<dyn DeviceQuery>) -> Self {
        let device_label: &[&str] = &["device"];

        Self {
            device,

            up: MetricDescriptor::gauge(
                "node_network_up",
                "Whether the interface is connected.",
                device_label,
            ),
            info: MetricDescriptor::gauge(
                "node_network_info",
                "Non-numeric interface metadata.",
                &["device", "operstate", "address", "description", "hardware"],
            ),
            mtu_bytes: MetricDescriptor::gauge(
                "node_network_mtu_bytes",
                "MTU of the interface.",
                device_label,
            ),
            speed_bytes: MetricDescriptor::gauge(
                "node_network_speed_bytes",
                "Speed of the interface in bytes per second.",
                device_label,
            ),

            receive_bytes: MetricDescriptor::counter(
                "node_network_receive_bytes_total",
                "Total bytes received.",
                device_label,
            ),
            transmit_bytes: MetricDescriptor::counter(
                "node_network_transmit_bytes_total",
                "Total bytes transmitted.",
                device_label,
            ),
            receive_packets: MetricDescriptor::counter(
                "node_network_receive_packets_total",
                "Total packets received.",
                device_label,
            ),
            transmit_packets: MetricDescriptor::counter(
                "node_network_transmit_packets_total",
                "Total packets transmitted.",
                device_label,
            ),
            receive_errs: MetricDescriptor::counter(
                "node_network_receive_errs_total",
                "Total receive errors.",
                device_label,
            ),
            transmit_errs: MetricDescriptor::counter(
                "node_network_transmit_errs_total",
                "Total transmit errors.",
                device_label,
            ),
            receive_drop: MetricDescriptor::counter(
                "node_network_receive_drop_total",
                "Total received packets dropped.",
                device_label,
            ),
            transmit_drop: MetricDescriptor::counter(
                "node_network_transmit_drop_total",
                "Total transmitted packets dropped.",
                device_label,
            ),
            receive_multicast: MetricDescriptor::counter(
                "node_network_receive_multicast_total",
                "Total multicast packets received.",
                device_label,
            ),
            receive_broadcast: MetricDescriptor::counter(
                "node_network_receive_broadcast_total",
                "Total broadcast packets received.",
                device_label,
            ),
            transmit_multicast: MetricDescriptor::counter(
                "node_network_transmit_multicast_total",
                "Total multicast packets transmitted.",
                device_label,
            ),
            transmit_broadcast: MetricDescriptor::counter(
                "node_network_transmit_broadcast_total",
                "Total broadcast packets transmitted.",
                device_label,
            ),
            carrier_changes: MetricDescriptor::counter(
                "node_network_carrier_changes_total",
                "Total carrier link status changes.",
                device_label,
            ),
        }
    }

    fn emit_interface(&self, sink: &mut MetricSink, name: &str, iface: &Interface) {
        let device = &[name];

        sink.emit(&self.up, bool_gauge(iface.is_connected()), device);
        sink.emit(
            &self.info,
            1.0,
            &[
                name,
                iface.interface_status.as_str(),
                iface.physical_address.as_str(),
                iface.description.as_str(),
                iface.hardware.as_str(),
            ],
        );

        sink.emit(&self.mtu_bytes, iface.mtu as f64, device);
        sink.emit(&self.speed_bytes, iface.bandwidth as f64 / 8.0, device);

        let counters = &iface.interface_counters;
        sink.emit(&self.receive_bytes, counters.in_octets as f64, device);
        sink.emit(&self.transmit_bytes, counters.out_octets as f64, device);
        sink.emit(&self.receive_packets, counters.in_packets() as f64, device);
        sink.emit(&self.transmit_packets, counters.out_packets() as f64, device);
        sink.emit(&self.receive_errs, counters.total_in_errors as f64, device);
        sink.emit(&self.transmit_errs, counters.total_out_errors as f64, device);
        sink.emit(&self.receive_drop, counters.in_discards as f64, device);
        sink.emit(&self.transmit_drop, counters.out_discards as f64, device);
        sink.emit(&self.receive_multicast, counters.in_multicast_pkts as f64, device);
        sink.emit(&self.receive_broadcast, counters.in_broadcast_pkts as f64, device);
        sink.emit(&self.transmit_multicast, counters.out_multicast_pkts as f64, device);
        sink.emit(&self.transmit_broadcast, counters.out_broadcast_pkts as f64, device);
        sink.emit(&self.carrier_changes, counters.link_status_changes as f64, device);
    }
}

#[async_trait]
impl Collector for InterfaceCollector {
    fn name(&self) -> &'static str {
        "interface"
    }

    fn describe(&self) -> Vec<Arc<MetricDescriptor>> {
        [
            &self.up,
            &self.info,
            &self.mtu_bytes,
            &self.speed_bytes,
            &self.receive_bytes,
            &self.transmit_bytes,
            &self.receive_packets,
            &self.transmit_packets,
            &self.receive_errs,
            &self.transmit_errs,
            &self.receive_drop,
            &self.transmit_drop,
            &self.receive_multicast,
            &self.receive_broadcast,
            &self.transmit_multicast,
            &self.transmit_broadcast,
            &self.carrier_changes,
        ]
        .into_iter()
        .map(Arc::clone)
        .collect()
    }

    async fn collect(&self, sink: &mut MetricSink) -> Result<()> {
        let result = self
            .device
            .show_interfaces()
            .await
            .inspect_err(|err| debug!(error = %err, "failed to get interface data"))?;

        for (name, iface) in &result.interfaces {
            self.emit_interface(sink, name, iface);
        }

        Ok(())
    }
}
