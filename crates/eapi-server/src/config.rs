use clap::Parser;

/// Listener settings. Device settings come from `EAPI_*` environment
/// variables, see `eapi_client::DeviceConfig::from_env`.
#[derive(Debug, Parser)]
#[command(name = "eapi-exporter", about = "Prometheus exporter for Arista eAPI devices")]
pub struct Cli {
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, default_value = "9120")]
    pub port: u16,

    /// Emit logs as JSON lines.
    #[arg(long, default_value_t = false)]
    pub log_json: bool,
}

impl Cli {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
