use async_trait::async_trait;
use eapi_common::error::Result;

use crate::types::{ShowEnvironmentPower, ShowHostname, ShowInterfaces, ShowVersion};

/// The show commands the exporter issues against a device.
///
/// Implementations must be safe to call from concurrent requests: the
/// metrics scrape and the readiness probe share one session.
#[async_trait]
pub trait DeviceQuery: Send + Sync {
    async fn show_interfaces(&self) -> Result<ShowInterfaces>;
    async fn show_version(&self) -> Result<ShowVersion>;
    async fn show_environment_power(&self) -> Result<ShowEnvironmentPower>;
    async fn show_hostname(&self) -> Result<ShowHostname>;
}
