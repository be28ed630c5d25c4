//! Minimal Ethereum JSON-RPC client.

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;
use url::Url;

use chainvault_common::{Error, Result};

/// Error object returned by the node.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl RpcErrorObject {
    /// Whether the node reports an EVM revert.
    pub fn is_revert(&self) -> bool {
        self.code == 3 || self.message.to_ascii_lowercase().contains("revert")
    }

    /// Hex revert data, if the node attached any.
    pub fn revert_data(&self) -> Option<&str> {
        match &self.data {
            Some(serde_json::Value::String(data)) => Some(data),
            Some(serde_json::Value::Object(map)) => map.get("data").and_then(|v| v.as_str()),
            _ => None,
        }
    }
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: serde_json::Value,
}

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

/// JSON-RPC client bound to a single endpoint.
pub struct JsonRpcClient {
    http: Client,
    endpoint: Url,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    /// Create a client for `endpoint` with a per-request timeout.
    pub fn new(endpoint: Url, request_timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .user_agent("ChainVault/0.1")
            .timeout(request_timeout)
            .build()
            .map_err(|e| Error::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint,
            next_id: AtomicU64::new(1),
        })
    }

    /// Issue a request.
    ///
    /// The outer result carries transport failures. The inner result
    /// carries the node's own error object, which callers interpret.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<std::result::Result<Option<T>, RpcErrorObject>> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = RpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };

        debug!(method, id, "JSON-RPC request");

        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Network(format!("{} failed: {}", method, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Network(format!("{} failed: HTTP {}", method, status)));
        }

        let parsed: RpcResponse<T> = response
            .json()
            .await
            .map_err(|e| Error::Network(format!("{} returned malformed response: {}", method, e)))?;

        match parsed.error {
            Some(error) => Ok(Err(error)),
            None => Ok(Ok(parsed.result)),
        }
    }
}
