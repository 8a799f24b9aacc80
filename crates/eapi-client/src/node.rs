use async_trait::async_trait;
use eapi_common::error::{ExporterError, Result};
use serde_json::Value;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::{
    config::DeviceConfig,
    query::DeviceQuery,
    rpc::{Request, Response},
    types::{ShowEnvironmentPower, ShowHostname, ShowInterfaces, ShowVersion},
};

pub const COMMAND_API_PATH: &str = "/command-api";

/// An authenticated eAPI session to a single device.
///
/// Creating the session does not contact the device; the first command does.
/// `reqwest::Client` pools connections and is safe to share, so one node can
/// serve overlapping requests.
#[derive(Clone)]
pub struct EapiNode {
    endpoint: Url,
    username: String,
    password: String,
    client: reqwest::Client,
}

impl EapiNode {
    pub fn connect(config: &DeviceConfig) -> Result<Self> {
        let endpoint = command_api_url(config)?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(!config.tls_verify)
            .no_proxy()
            .build()
            .map_err(|err| ExporterError::Config(format!("failed to build http client: {err}")))?;

        Ok(Self {
            endpoint,
            username: config.username.clone(),
            password: config.password.clone(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    pub async fn run_commands(&self, cmds: &[&str]) -> Result<Vec<Value>> {
        let request = Request::run_cmds(Uuid::new_v4().to_string(), cmds);
        debug!(endpoint = %self.endpoint, cmds = ?cmds, id = %request.id, "sending eapi request");

        let response = self
            .client
            .post(self.endpoint.clone())
            .basic_auth(&self.username, Some(&self.password))
            .json(&request)
            .send()
            .await
            .map_err(|err| {
                ExporterError::Transport(format!("request to {} failed: {err}", self.endpoint))
            })?;

        if !response.status().is_success() {
            return Err(ExporterError::Transport(format!(
                "{} returned status {}",
                self.endpoint,
                response.status()
            )));
        }

        let body: Response = response.json().await.map_err(|err| {
            ExporterError::Decode(format!("invalid json-rpc response from {}: {err}", self.endpoint))
        })?;

        if body.id.as_deref().is_some_and(|id| id != request.id) {
            return Err(ExporterError::Decode(format!(
                "response id {:?} does not match request id {}",
                body.id, request.id
            )));
        }

        body.into_results(cmds.len())
    }

    async fn run_json(&self, cmd: &str) -> Result<Value> {
        self.run_commands(&[cmd])
            .await?
            .pop()
            .ok_or_else(|| ExporterError::Decode(format!("{cmd}: empty result")))
    }
}

#[async_trait]
impl DeviceQuery for EapiNode {
    async fn show_interfaces(&self) -> Result<ShowInterfaces> {
        ShowInterfaces::from_value(self.run_json(ShowInterfaces::COMMAND).await?)
    }

    async fn show_version(&self) -> Result<ShowVersion> {
        ShowVersion::from_value(self.run_json(ShowVersion::COMMAND).await?)
    }

    async fn show_environment_power(&self) -> Result<ShowEnvironmentPower> {
        ShowEnvironmentPower::from_value(self.run_json(ShowEnvironmentPower::COMMAND).await?)
    }

    async fn show_hostname(&self) -> Result<ShowHostname> {
        ShowHostname::from_value(self.run_json(ShowHostname::COMMAND).await?)
    }
}

fn command_api_url(config: &DeviceConfig) -> Result<Url> {
    let host = config.host.trim();
    if host.is_empty() {
        return Err(ExporterError::Config("device host is empty".to_string()));
    }

    let host = if host.contains(':') && !host.starts_with('[') {
        format!("[{host}]")
    } else {
        host.to_string()
    };

    let raw = format!(
        "{}://{host}:{}{COMMAND_API_PATH}",
        config.protocol.as_str(),
        config.port
    );
    Url::parse(&raw).map_err(|err| ExporterError::Config(format!("invalid device url {raw}: {err}")))
}

#[cfg(test)]
mod tests {
    use axum::{
        Json, Router,
        http::{HeaderMap, StatusCode, header::AUTHORIZATION},
        response::{IntoResponse, Response as AxumResponse},
        routing::post,
    };
    use serde_json::json;

    use super::*;
    use crate::config::Protocol;

    // "admin:secret"
    const EXPECTED_AUTH: &str = "Basic YWRtaW46c2VjcmV0";

    async fn command_api(headers: HeaderMap, Json(request): Json<Value>) -> AxumResponse {
        let authorized = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value == EXPECTED_AUTH);
        if !authorized {
            return StatusCode::UNAUTHORIZED.into_response();
        }

        let id = request["id"].clone();
        let cmds = request["params"]["cmds"].as_array().cloned().unwrap_or_default();
        let mut results = Vec::new();
        for cmd in &cmds {
            let result = match cmd.as_str() {
                Some("show version") => json!({
                    "modelName": "DCS-7280SR-48C6",
                    "version": "4.30.1F",
                    "bootupTimestamp": 1700000000.25
                }),
                Some("show hostname") => json!({"hostname": "leaf1", "fqdn": "leaf1.lab"}),
                Some("show interfaces") => json!({
                    "interfaces": {
                        "Ethernet1": {"interfaceStatus": "connected", "mtu": 9214},
                        "Ethernet2": {"interfaceStatus": "disabled", "mtu": 1500}
                    }
                }),
                _ => {
                    return Json(json!({
                        "jsonrpc": "2.0",
                        "id": id,
                        "error": {"code": 1002, "message": "invalid command"}
                    }))
                    .into_response();
                }
            };
            results.push(result);
        }

        Json(json!({"jsonrpc": "2.0", "id": id, "result": results})).into_response()
    }

    async fn spawn_stub() -> u16 {
        let app = Router::new().route(COMMAND_API_PATH, post(command_api));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        port
    }

    fn node(port: u16, password: &str) -> EapiNode {
        let config = DeviceConfig::new(Protocol::Http, "127.0.0.1", "admin", password, port);
        EapiNode::connect(&config).unwrap()
    }

    #[test]
    fn builds_command_api_url() {
        let config = DeviceConfig::new(Protocol::Https, "switch1", "admin", "secret", 443);
        assert_eq!(
            command_api_url(&config).unwrap().as_str(),
            "https://switch1/command-api"
        );

        let config = DeviceConfig::new(Protocol::Http, "fd00::1", "admin", "secret", 8080);
        assert_eq!(
            command_api_url(&config).unwrap().as_str(),
            "http://[fd00::1]:8080/command-api"
        );

        let config = DeviceConfig::new(Protocol::Http, " ", "admin", "secret", 80);
        assert!(matches!(command_api_url(&config), Err(ExporterError::Config(_))));
    }

    #[tokio::test]
    async fn runs_typed_show_commands() {
        let node = node(spawn_stub().await, "secret");

        let version = node.show_version().await.unwrap();
        assert_eq!(version.model_name, "DCS-7280SR-48C6");
        assert_eq!(version.bootup_timestamp, 1700000000.25);

        let hostname = node.show_hostname().await.unwrap();
        assert_eq!(hostname.hostname, "leaf1");

        let interfaces = node.show_interfaces().await.unwrap();
        assert_eq!(interfaces.interfaces.len(), 2);
        assert!(interfaces.interfaces["Ethernet1"].is_connected());
        assert!(!interfaces.interfaces["Ethernet2"].is_connected());
    }

    #[tokio::test]
    async fn runs_multiple_commands_in_one_request() {
        let node = node(spawn_stub().await, "secret");

        let results = node
            .run_commands(&["show hostname", "show version"])
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["hostname"], "leaf1");
    }

    #[tokio::test]
    async fn device_errors_are_surfaced() {
        let node = node(spawn_stub().await, "secret");

        let err = node.show_environment_power().await.unwrap_err();
        assert!(matches!(err, ExporterError::Device { code: 1002, .. }), "{err}");
    }

    #[tokio::test]
    async fn rejected_credentials_are_transport_errors() {
        let node = node(spawn_stub().await, "wrong");

        let err = node.show_hostname().await.unwrap_err();
        assert!(err.is_unreachable(), "{err}");
        assert!(err.to_string().contains("401"), "{err}");
    }

    #[tokio::test]
    async fn unreachable_device_is_a_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = node(port, "secret").show_version().await.unwrap_err();
        assert!(matches!(err, ExporterError::Transport(_)), "{err}");
        assert!(err.is_unreachable());
    }
}
