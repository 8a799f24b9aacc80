use std::collections::BTreeMap;

use eapi_common::error::{ExporterError, Result};
use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::warn;

/// EOS reports some fields as `null` instead of leaving them out. Those
/// decode to the zero value so the rest of the record survives.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InterfaceCounters {
    #[serde(deserialize_with = "null_as_default")]
    pub in_octets: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub out_octets: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub in_ucast_pkts: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub out_ucast_pkts: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub in_multicast_pkts: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub out_multicast_pkts: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub in_broadcast_pkts: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub out_broadcast_pkts: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub total_in_errors: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub total_out_errors: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub in_discards: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub out_discards: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub link_status_changes: u64,
}

impl InterfaceCounters {
    pub fn in_packets(&self) -> u64 {
        self.in_ucast_pkts
            .saturating_add(self.in_multicast_pkts)
            .saturating_add(self.in_broadcast_pkts)
    }

    pub fn out_packets(&self) -> u64 {
        self.out_ucast_pkts
            .saturating_add(self.out_multicast_pkts)
            .saturating_add(self.out_broadcast_pkts)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Interface {
    #[serde(deserialize_with = "null_as_default")]
    pub interface_status: String,
    #[serde(deserialize_with = "null_as_default")]
    pub mtu: u64,
    /// Link bandwidth in bits per second.
    #[serde(deserialize_with = "null_as_default")]
    pub bandwidth: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub physical_address: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub hardware: String,
    #[serde(deserialize_with = "null_as_default")]
    pub interface_counters: InterfaceCounters,
}

impl Interface {
    /// Only the exact, lowercase `connected` status counts as up.
    pub fn is_connected(&self) -> bool {
        self.interface_status == "connected"
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShowInterfaces {
    pub interfaces: BTreeMap<String, Interface>,
}

impl ShowInterfaces {
    pub const COMMAND: &'static str = "show interfaces";

    pub fn from_value(value: Value) -> Result<Self> {
        let mut root = into_object(value, Self::COMMAND)?;
        Ok(Self {
            interfaces: decode_entries(Self::COMMAND, root.remove("interfaces")),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShowVersion {
    #[serde(deserialize_with = "null_as_default")]
    pub model_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub version: String,
    #[serde(deserialize_with = "null_as_default")]
    pub serial_number: String,
    /// Unix timestamp of the last boot. Zero when the device does not report
    /// one.
    #[serde(deserialize_with = "null_as_default")]
    pub bootup_timestamp: f64,
}

impl ShowVersion {
    pub const COMMAND: &'static str = "show version";

    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|err| ExporterError::Decode(format!("{}: {err}", Self::COMMAND)))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShowHostname {
    #[serde(deserialize_with = "null_as_default")]
    pub hostname: String,
    #[serde(deserialize_with = "null_as_default")]
    pub fqdn: String,
}

impl ShowHostname {
    pub const COMMAND: &'static str = "show hostname";

    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|err| ExporterError::Decode(format!("{}: {err}", Self::COMMAND)))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TempSensor {
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(deserialize_with = "null_as_default")]
    pub temperature: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fan {
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(deserialize_with = "null_as_default")]
    pub speed: f64,
}

impl Fan {
    pub fn is_ok(&self) -> bool {
        status_ok(&self.status)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PowerSupply {
    #[serde(deserialize_with = "null_as_default")]
    pub state: String,
    #[serde(deserialize_with = "null_as_default")]
    pub model_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub capacity: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub input_current: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub output_current: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub output_power: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub uptime: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub temp_sensors: BTreeMap<String, TempSensor>,
    #[serde(deserialize_with = "null_as_default")]
    pub fans: BTreeMap<String, Fan>,
}

impl PowerSupply {
    pub fn is_ok(&self) -> bool {
        status_ok(&self.state)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowEnvironmentPower {
    pub power_supplies: BTreeMap<String, PowerSupply>,
}

impl ShowEnvironmentPower {
    pub const COMMAND: &'static str = "show environment power";

    pub fn from_value(value: Value) -> Result<Self> {
        let mut root = into_object(value, Self::COMMAND)?;
        Ok(Self {
            power_supplies: decode_entries(Self::COMMAND, root.remove("powerSupplies")),
        })
    }
}

/// Power and fan states are compared case-insensitively, unlike interface
/// link status.
pub fn status_ok(status: &str) -> bool {
    status.eq_ignore_ascii_case("ok")
}

fn into_object(value: Value, command: &str) -> Result<serde_json::Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(ExporterError::Decode(format!(
            "{command}: expected an object, got {}",
            json_kind(&other)
        ))),
    }
}

/// Decodes each entry of a keyed table on its own so one malformed entry
/// does not discard the rest.
fn decode_entries<T: DeserializeOwned>(command: &str, table: Option<Value>) -> BTreeMap<String, T> {
    let entries = match table {
        Some(Value::Object(entries)) => entries,
        Some(Value::Null) | None => return BTreeMap::new(),
        Some(other) => {
            warn!(command, kind = json_kind(&other), "unexpected table type in device response");
            return BTreeMap::new();
        }
    };

    entries
        .into_iter()
        .filter_map(|(name, entry)| match serde_json::from_value::<T>(entry) {
            Ok(decoded) => Some((name, decoded)),
            Err(err) => {
                warn!(command, entry = %name, error = %err, "skipping malformed entry");
                None
            }
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
