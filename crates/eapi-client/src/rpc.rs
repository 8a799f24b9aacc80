use eapi_common::error::{ExporterError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";
pub const RUN_CMDS: &str = "runCmds";
/// Every command is requested as structured output; the collectors never
/// parse CLI text.
pub const FORMAT_JSON: &str = "json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunCmdsParams {
    pub version: u32,
    pub cmds: Vec<String>,
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub jsonrpc: String,
    pub method: String,
    pub params: RunCmdsParams,
    pub id: String,
}

impl Request {
    pub fn run_cmds(id: impl Into<String>, cmds: &[&str]) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: RUN_CMDS.to_string(),
            params: RunCmdsParams {
                version: 1,
                cmds: cmds.iter().map(|cmd| (*cmd).to_string()).collect(),
                format: FORMAT_JSON.to_string(),
            },
            id: id.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub result: Option<Vec<Value>>,
    #[serde(default)]
    pub error: Option<RpcError>,
}

impl Response {
    /// Unwraps the per-command results, turning a JSON-RPC error object into
    /// `ExporterError::Device`.
    pub fn into_results(self, expected: usize) -> Result<Vec<Value>> {
        if let Some(error) = self.error {
            return Err(ExporterError::Device {
                code: error.code,
                message: error.message,
            });
        }

        let results = self.result.ok_or_else(|| {
            ExporterError::Decode("response carries neither result nor error".to_string())
        })?;

        if results.len() != expected {
            return Err(ExporterError::Decode(format!(
                "expected {expected} command results, got {}",
                results.len()
            )));
        }

        Ok(results)
    }
}
