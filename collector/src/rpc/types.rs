//! Payload types for the node RPC methods the collector consumes.
//!
//! Ethereum JSON-RPC encodes quantities as `0x`-prefixed base-16 strings.
//! Everything in here decodes those into plain integers so the rest of
//! the crate never sees the wire encoding.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur while talking to the node.
#[derive(Clone, Debug, Error)]
pub enum RpcError {
    /// Transport-level error (connection refused, timeout, TLS, ...).
    #[error("transport error: {0}")]
    Transport(String),
    /// The node answered with a non-success HTTP status.
    #[error("node returned HTTP status {0}")]
    Status(u16),
    /// The node answered with a JSON-RPC error object.
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    /// The response was not a JSON-RPC response or had an unexpected shape.
    #[error("protocol error: {0}")]
    Protocol(String),
    /// A hex quantity could not be decoded.
    #[error("invalid hex quantity `{0}`")]
    Quantity(String),
}

/// Outcome of a single RPC call.
pub type RpcResult<T> = Result<T, RpcError>;

/// Parses a base-16 quantity such as `"0x64"` into an integer.
///
/// The `0x` prefix is optional; an empty digit string is rejected.
pub fn parse_quantity(raw: &str) -> RpcResult<u64> {
    let digits = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .unwrap_or(raw);
    if digits.is_empty() {
        return Err(RpcError::Quantity(raw.to_string()));
    }
    u64::from_str_radix(digits, 16).map_err(|_| RpcError::Quantity(raw.to_string()))
}

/// Block range reported by `eth_syncing` while a sync is in progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SyncProgress {
    pub current_block: u64,
    pub highest_block: u64,
}

impl SyncProgress {
    /// Blocks behind the network head. Negative when the node reports a
    /// highest block below its current one.
    pub fn lag(&self) -> i64 {
        (self.highest_block as i128 - self.current_block as i128)
            .clamp(i64::MIN as i128, i64::MAX as i128) as i64
    }
}

/// Result of `eth_syncing`.
///
/// The node answers literal `false` when it is not syncing; that is a
/// successful answer, not a failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncState {
    NotSyncing,
    Syncing(SyncProgress),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSyncProgress {
    current_block: String,
    highest_block: String,
}

impl SyncState {
    pub fn from_value(value: Value) -> RpcResult<Self> {
        match value {
            Value::Bool(false) => Ok(SyncState::NotSyncing),
            Value::Object(_) => {
                let raw: RawSyncProgress = serde_json::from_value(value)
                    .map_err(|e| RpcError::Protocol(format!("eth_syncing: {e}")))?;
                Ok(SyncState::Syncing(SyncProgress {
                    current_block: parse_quantity(&raw.current_block)?,
                    highest_block: parse_quantity(&raw.highest_block)?,
                }))
            }
            other => Err(RpcError::Protocol(format!(
                "eth_syncing: expected `false` or an object, got {other}"
            ))),
        }
    }
}

/// Peer information returned by `parity_enode`.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct PeersInfo {
    #[serde(deserialize_with = "count")]
    pub active: u64,
    #[serde(deserialize_with = "count")]
    pub connected: u64,
    #[serde(deserialize_with = "count")]
    pub max: u64,
    #[serde(default)]
    pub enode: Option<String>,
}

impl PeersInfo {
    /// The enode URL, if the node reported a non-empty one.
    pub fn enode(&self) -> Option<&str> {
        self.enode.as_deref().filter(|s| !s.is_empty())
    }
}

/// Peer counts show up both as JSON integers and as hex quantities
/// depending on the client version.
fn count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Int(u64),
        Hex(String),
    }

    match Count::deserialize(deserializer)? {
        Count::Int(n) => Ok(n),
        Count::Hex(s) => parse_quantity(&s).map_err(serde::de::Error::custom),
    }
}

/// The four call results one refresh cycle works from.
#[derive(Debug)]
pub struct NodeSnapshot {
    pub client_version: RpcResult<String>,
    pub sync: RpcResult<SyncState>,
    pub block_number: RpcResult<u64>,
    pub peers: RpcResult<PeersInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_hex_quantities() {
        assert_eq!(parse_quantity("0x0").unwrap(), 0);
        assert_eq!(parse_quantity("0xff").unwrap(), 255);
        assert_eq!(parse_quantity("0X10").unwrap(), 16);
        assert_eq!(parse_quantity("64").unwrap(), 100);
        assert_eq!(
            parse_quantity("0x10").unwrap() as i64 - parse_quantity("0x5").unwrap() as i64,
            11
        );
    }

    #[test]
    fn rejects_malformed_quantities() {
        for raw in ["", "0x", "0xzz", "-0x1", "0x1ffffffffffffffff"] {
            assert!(
                matches!(parse_quantity(raw), Err(RpcError::Quantity(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn sync_state_false_is_not_syncing() {
        assert_eq!(
            SyncState::from_value(json!(false)).unwrap(),
            SyncState::NotSyncing
        );
    }

    #[test]
    fn sync_state_object_is_parsed() {
        let value = json!({
            "startingBlock": "0x0",
            "currentBlock": "0x5",
            "highestBlock": "0x10"
        });
        let state = SyncState::from_value(value).unwrap();
        let SyncState::Syncing(progress) = state else {
            panic!("expected syncing state, got {state:?}");
        };
        assert_eq!(progress.current_block, 5);
        assert_eq!(progress.highest_block, 16);
        assert_eq!(progress.lag(), 11);
    }

    #[test]
    fn sync_lag_can_be_negative() {
        let progress = SyncProgress {
            current_block: 120,
            highest_block: 100,
        };
        assert_eq!(progress.lag(), -20);
    }

    #[test]
    fn sync_state_rejects_other_shapes() {
        assert!(matches!(
            SyncState::from_value(json!(true)),
            Err(RpcError::Protocol(_))
        ));
        assert!(matches!(
            SyncState::from_value(json!({ "currentBlock": "0x1" })),
            Err(RpcError::Protocol(_))
        ));
        assert!(matches!(
            SyncState::from_value(json!({ "currentBlock": "0x1", "highestBlock": "nope" })),
            Err(RpcError::Quantity(_))
        ));
    }

    #[test]
    fn peers_info_accepts_integer_and_hex_counts() {
        let peers: PeersInfo = serde_json::from_value(json!({
            "active": 3,
            "connected": "0x5",
            "max": 50,
            "enode": "enode://abc"
        }))
        .expect("peers info should parse");
        assert_eq!(peers.active, 3);
        assert_eq!(peers.connected, 5);
        assert_eq!(peers.max, 50);
        assert_eq!(peers.enode(), Some("enode://abc"));
    }

    #[test]
    fn empty_enode_is_treated_as_absent() {
        let peers: PeersInfo = serde_json::from_value(json!({
            "active": 0,
            "connected": 0,
            "max": 25,
            "enode": ""
        }))
        .unwrap();
        assert_eq!(peers.enode(), None);

        let peers: PeersInfo =
            serde_json::from_value(json!({ "active": 0, "connected": 0, "max": 25 })).unwrap();
        assert_eq!(peers.enode(), None);
    }
}
