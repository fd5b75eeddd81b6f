//! Collector library crate.
//!
//! This crate provides the pieces of a Parity/OpenEthereum health exporter:
//!
//! - a JSON-RPC client for the node (`rpc`),
//! - the node health gauges and their text exposition (`metrics`),
//! - the refresh cycle that ties the two together (`collector`),
//! - and the collector configuration (`config`).
//!
//! Binaries compose these with an HTTP server and a refresh timer.

pub mod collector;
pub mod config;
pub mod metrics;
pub mod rpc;

pub use collector::{
    Collector, LastRefresh, NodeReading, PeerReading, RefreshOutcome, create_metrics,
};
pub use config::{CollectorConfig, ConfigError};
pub use metrics::{Exposition, GaugeValues, MetricsRegistry, NodeGauges};
pub use rpc::{
    HttpRpcClient, NodeSnapshot, PeersInfo, RpcClient, RpcError, RpcResult, SyncProgress,
    SyncState, parse_quantity,
};

/// Collector type used by the exporter binary.
pub type DefaultCollector = Collector<HttpRpcClient>;
