//! HTTP JSON-RPC client for the node.
//!
//! Requests are JSON-RPC 2.0 envelopes POSTed to the node endpoint:
//!
//! ```json
//! { "jsonrpc": "2.0", "id": 7, "method": "eth_blockNumber", "params": [] }
//! ```
//!
//! and the node answers with either a `result` or an `error` member:
//!
//! ```json
//! { "jsonrpc": "2.0", "id": 7, "result": "0x64" }
//! { "jsonrpc": "2.0", "id": 7, "error": { "code": -32601, "message": "Method not found" } }
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::RpcClient;
use super::types::{PeersInfo, RpcError, RpcResult, SyncState, parse_quantity};

/// JSON-RPC client bound to a single node endpoint.
///
/// Cheap to share: the underlying `reqwest` client pools connections and
/// request ids come from an atomic counter.
pub struct HttpRpcClient {
    endpoint: String,
    client: Client,
    next_id: AtomicU64,
}

impl HttpRpcClient {
    /// Constructs a client for `endpoint`, e.g. `"http://127.0.0.1:8545"`.
    ///
    /// `timeout` bounds every individual request.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> RpcResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RpcError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            endpoint: endpoint.into(),
            client,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Performs one JSON-RPC call and returns the raw `result` member.
    pub async fn call(&self, method: &str, params: Value) -> RpcResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let req_body = RequestEnvelope {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .json(&req_body)
            .send()
            .await
            .map_err(|e| RpcError::Transport(format!("{method} to {} failed: {e}", self.endpoint)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(RpcError::Status(status.as_u16()));
        }

        let body = resp
            .json::<ResponseEnvelope>()
            .await
            .map_err(|e| RpcError::Protocol(format!("{method}: failed to parse response: {e}")))?;

        tracing::trace!(method, id, "rpc call completed");

        match (body.result, body.error) {
            (_, Some(err)) => Err(RpcError::Rpc {
                code: err.code,
                message: err.message,
            }),
            (Some(result), None) => Ok(result),
            (None, None) => Err(RpcError::Protocol(format!(
                "{method}: response carries neither result nor error"
            ))),
        }
    }
}

#[derive(Debug, Serialize)]
struct RequestEnvelope<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct ResponseEnvelope {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<ErrorObject>,
}

#[derive(Debug, Deserialize)]
struct ErrorObject {
    code: i64,
    #[serde(default)]
    message: String,
}

fn no_params() -> Value {
    Value::Array(Vec::new())
}

fn expect_string(method: &str, value: Value) -> RpcResult<String> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(RpcError::Protocol(format!(
            "{method}: expected a string, got {other}"
        ))),
    }
}

impl RpcClient for HttpRpcClient {
    async fn client_version(&self) -> RpcResult<String> {
        let value = self.call("web3_clientVersion", no_params()).await?;
        expect_string("web3_clientVersion", value)
    }

    async fn syncing(&self) -> RpcResult<SyncState> {
        let value = self.call("eth_syncing", no_params()).await?;
        SyncState::from_value(value)
    }

    async fn block_number(&self) -> RpcResult<u64> {
        let value = self.call("eth_blockNumber", no_params()).await?;
        parse_quantity(&expect_string("eth_blockNumber", value)?)
    }

    async fn peers(&self) -> RpcResult<PeersInfo> {
        let value = self.call("parity_enode", no_params()).await?;
        serde_json::from_value(value)
            .map_err(|e| RpcError::Protocol(format!("parity_enode: {e}")))
    }
}
