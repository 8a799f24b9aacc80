use std::{fmt, time::Duration};

use eapi_common::error::{ExporterError, Result};
use tracing::warn;

pub const DEFAULT_PORT: u16 = 443;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Protocol {
    Http,
    #[default]
    Https,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }

    /// Unknown values fall back to https. A non-empty unknown value is
    /// logged so a typo does not go unnoticed.
    pub fn parse_or_default(value: &str) -> Self {
        match value {
            "http" => Self::Http,
            "https" => Self::Https,
            "" => Self::default(),
            other => {
                warn!(protocol = %other, "invalid EAPI_PROTOCOL, falling back to https");
                Self::default()
            }
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone)]
pub struct DeviceConfig {
    pub protocol: Protocol,
    pub host: String,
    pub username: String,
    pub password: String,
    pub port: u16,
    pub tls_verify: bool,
    pub timeout: Duration,
}

impl fmt::Debug for DeviceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceConfig")
            .field("protocol", &self.protocol)
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("port", &self.port)
            .field("tls_verify", &self.tls_verify)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl DeviceConfig {
    pub fn new(
        protocol: Protocol,
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        port: u16,
    ) -> Self {
        Self {
            protocol,
            host: host.into(),
            username: username.into(),
            password: password.into(),
            port,
            tls_verify: false,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .unwrap_or_default()
        };

        let protocol = Protocol::parse_or_default(&read("EAPI_PROTOCOL"));
        let host = required(&read, "EAPI_HOST")?;
        let username = required(&read, "EAPI_USERNAME")?;
        let password = lookup("EAPI_PASSWORD")
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ExporterError::Config("EAPI_PASSWORD needs to be specified".to_string()))?;

        let port = match read("EAPI_PORT").as_str() {
            "" => DEFAULT_PORT,
            value => value.parse::<u16>().map_err(|_| {
                ExporterError::Config(format!("EAPI_PORT {value:?} is not a valid number"))
            })?,
        };

        let tls_verify = match read("EAPI_TLS_VERIFY").to_ascii_lowercase().as_str() {
            "" | "0" | "false" | "no" => false,
            "1" | "true" | "yes" => true,
            other => {
                return Err(ExporterError::Config(format!(
                    "EAPI_TLS_VERIFY {other:?} is not a boolean"
                )));
            }
        };

        let timeout = match read("EAPI_TIMEOUT_SECONDS").as_str() {
            "" => DEFAULT_TIMEOUT,
            value => value
                .parse::<u64>()
                .ok()
                .filter(|seconds| *seconds > 0)
                .map(Duration::from_secs)
                .ok_or_else(|| {
                    ExporterError::Config(format!(
                        "EAPI_TIMEOUT_SECONDS {value:?} is not a positive number"
                    ))
                })?,
        };

        Ok(Self {
            protocol,
            host,
            username,
            password,
            port,
            tls_verify,
            timeout,
        })
    }
}

fn required(read: &impl Fn(&str) -> String, key: &str) -> Result<String> {
    let value = read(key);
    if value.is_empty() {
        return Err(ExporterError::Config(format!("{key} needs to be specified")));
    }
    Ok(value)
}
