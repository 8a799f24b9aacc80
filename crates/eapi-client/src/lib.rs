pub mod config;
pub mod node;
pub mod query;
pub mod rpc;
pub mod types;

pub use config::{DeviceConfig, Protocol};
pub use node::EapiNode;
pub use query::DeviceQuery;
pub use types::{
    Fan, Interface, InterfaceCounters, PowerSupply, ShowEnvironmentPower, ShowHostname,
    ShowInterfaces, ShowVersion, TempSensor,
};
