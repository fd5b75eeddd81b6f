//! Exporter configuration.
//!
//! Every setting is a CLI flag that can also be supplied through the
//! environment, which is how the exporter is usually configured when run
//! next to a node in a container.

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;

use collector::CollectorConfig;

/// Prometheus exporter for Parity/OpenEthereum nodes.
#[derive(Parser, Clone, Debug)]
#[command(name = "parity-exporter", version, about)]
pub struct ExporterConfig {
    /// JSON-RPC endpoint of the node to poll.
    #[arg(long, env = "NODE_URL", default_value = "http://127.0.0.1:8545")]
    pub node_url: String,

    /// Address to serve /metrics and /health on.
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:9898")]
    pub listen_addr: SocketAddr,

    /// Seconds between two refresh cycles.
    #[arg(long, env = "POLL_INTERVAL_SECS", default_value_t = 15)]
    pub poll_interval_secs: u64,

    /// Timeout for a single JSON-RPC request, in seconds.
    #[arg(long, env = "RPC_TIMEOUT_SECS", default_value_t = 5)]
    pub rpc_timeout_secs: u64,

    /// Prefix for every exported metric name.
    #[arg(long, env = "METRICS_NAMESPACE", default_value = "parity")]
    pub namespace: String,
}

impl ExporterConfig {
    /// Collector settings derived from the command line.
    pub fn collector(&self) -> CollectorConfig {
        CollectorConfig {
            node_url: self.node_url.clone(),
            rpc_timeout: Duration::from_secs(self.rpc_timeout_secs),
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            namespace: self.namespace.clone(),
        }
    }
}
