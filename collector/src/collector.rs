//! Periodic node health collection.
//!
//! A [`Collector`] runs one refresh cycle at a time: it takes a
//! [`NodeSnapshot`] from its [`RpcClient`], turns it into a
//! [`NodeReading`] and writes that into the shared [`NodeGauges`].
//!
//! Cycle rules:
//!
//! - `web3_clientVersion` failing means the node is down: only `up` is set
//!   (to 0) and every other gauge keeps its previous value.
//! - otherwise `up` is 1 and `version` is written, whatever the other
//!   calls did.
//! - `eth_syncing` failing or answering `false` yields a lag of 0.
//! - `current_block` and the peer gauges are written from their own call
//!   when it succeeded and keep their previous value when it did not.
//!
//! Nothing here returns an error to the caller; failures are logged.

use std::sync::{Arc, RwLock};
use std::time::SystemTime;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::config::CollectorConfig;
use crate::metrics::{MetricsRegistry, NodeGauges};
use crate::rpc::{
    HttpRpcClient, NodeSnapshot, PeersInfo, RpcClient, RpcResult, SyncState,
};

/// How a call to [`Collector::refresh`] ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshOutcome {
    /// Every gauge was updated and `up` is 1.
    Up,
    /// `up` is 1 and `version` is current, but `eth_blockNumber` or
    /// `parity_enode` failed and their gauges kept the previous values.
    Partial,
    /// The node did not answer `web3_clientVersion`; `up` is 0.
    Down,
    /// Another refresh was still running; this one did nothing.
    Skipped,
}

/// Completed refresh cycle, as reported by [`Collector::last_refresh`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LastRefresh {
    pub outcome: RefreshOutcome,
    pub finished_at: SystemTime,
}

/// Peer gauges taken from one `parity_enode` answer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PeerReading {
    pub active: i64,
    pub connected: i64,
    pub max: i64,
    pub enode_address: Option<String>,
}

impl From<PeersInfo> for PeerReading {
    fn from(peers: PeersInfo) -> Self {
        Self {
            active: gauge_value(peers.active),
            connected: gauge_value(peers.connected),
            max: gauge_value(peers.max),
            enode_address: peers.enode().map(str::to_string),
        }
    }
}

/// Everything one cycle writes after a successful `web3_clientVersion`,
/// computed before any gauge is touched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeReading {
    pub version: String,
    pub sync_status: i64,
    /// `None` when `eth_blockNumber` failed.
    pub current_block: Option<i64>,
    /// `None` when `parity_enode` failed.
    pub peers: Option<PeerReading>,
}

impl NodeReading {
    /// Builds a reading from the calls that follow a successful
    /// `web3_clientVersion`. Failed calls are logged and left out.
    pub fn new(
        version: String,
        sync: RpcResult<SyncState>,
        block_number: RpcResult<u64>,
        peers: RpcResult<PeersInfo>,
    ) -> Self {
        let sync_status = match sync {
            Ok(SyncState::Syncing(progress)) => progress.lag(),
            Ok(SyncState::NotSyncing) => 0,
            Err(e) => {
                tracing::debug!(error = %e, "eth_syncing unavailable, reporting no lag");
                0
            }
        };
        let current_block = match block_number {
            Ok(n) => Some(gauge_value(n)),
            Err(e) => {
                tracing::warn!(error = %e, "failed to fetch eth_blockNumber");
                None
            }
        };
        let peers = match peers {
            Ok(peers) => Some(PeerReading::from(peers)),
            Err(e) => {
                tracing::warn!(error = %e, "failed to fetch parity_enode");
                None
            }
        };

        Self {
            version,
            sync_status,
            current_block,
            peers,
        }
    }

    /// Whether every optional call contributed to this reading.
    pub fn is_complete(&self) -> bool {
        self.current_block.is_some() && self.peers.is_some()
    }

    /// Writes the reading into `gauges` and marks the node up.
    ///
    /// `enode_address` is left alone when the node reported none.
    pub fn apply(&self, gauges: &NodeGauges) {
        gauges.up.set(1);
        gauges.set_version(&self.version);
        gauges.sync_status.set(self.sync_status);
        if let Some(current_block) = self.current_block {
            gauges.current_block.set(current_block);
        }
        if let Some(peers) = &self.peers {
            gauges.active_peers.set(peers.active);
            gauges.connected_peers.set(peers.connected);
            gauges.max_peers.set(peers.max);
            if let Some(enode) = &peers.enode_address {
                gauges.set_enode_address(enode);
            }
        }
    }
}

fn gauge_value(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// Refreshes the node gauges from one node.
pub struct Collector<C> {
    client: C,
    metrics: Arc<MetricsRegistry>,
    in_flight: Mutex<()>,
    last_refresh: RwLock<Option<LastRefresh>>,
}

impl<C: RpcClient> Collector<C> {
    pub fn new(client: C, metrics: Arc<MetricsRegistry>) -> Self {
        Self {
            client,
            metrics,
            in_flight: Mutex::new(()),
            last_refresh: RwLock::new(None),
        }
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    /// Outcome and completion time of the most recent cycle that ran.
    /// Skipped calls are not recorded.
    pub fn last_refresh(&self) -> Option<LastRefresh> {
        *self
            .last_refresh
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Runs one refresh cycle.
    ///
    /// Overlapping calls are not queued: if a cycle is already running the
    /// call returns [`RefreshOutcome::Skipped`] immediately.
    pub async fn refresh(&self) -> RefreshOutcome {
        let Ok(_guard) = self.in_flight.try_lock() else {
            tracing::debug!("refresh already in flight, skipping");
            return RefreshOutcome::Skipped;
        };

        let snapshot = self.client.snapshot().await;
        let outcome = self.apply_snapshot(snapshot);

        *self
            .last_refresh
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(LastRefresh {
            outcome,
            finished_at: SystemTime::now(),
        });
        outcome
    }

    fn apply_snapshot(&self, snapshot: NodeSnapshot) -> RefreshOutcome {
        let gauges = &self.metrics.node;

        let version = match snapshot.client_version {
            Ok(version) => version,
            Err(e) => {
                tracing::warn!(error = %e, "node did not answer web3_clientVersion, marking down");
                gauges.up.set(0);
                return RefreshOutcome::Down;
            }
        };

        let reading = NodeReading::new(
            version,
            snapshot.sync,
            snapshot.block_number,
            snapshot.peers,
        );
        reading.apply(gauges);
        tracing::debug!(
            version = %reading.version,
            current_block = ?reading.current_block,
            sync_status = reading.sync_status,
            connected_peers = ?reading.peers.as_ref().map(|p| p.connected),
            "node metrics refreshed"
        );

        if reading.is_complete() {
            RefreshOutcome::Up
        } else {
            RefreshOutcome::Partial
        }
    }
}

/// Builds a collector polling the node at `cfg.node_url` over HTTP and
/// writing into `metrics`.
pub fn create_metrics(
    cfg: &CollectorConfig,
    metrics: Arc<MetricsRegistry>,
) -> RpcResult<Collector<HttpRpcClient>> {
    let client = HttpRpcClient::new(cfg.node_url.clone(), cfg.rpc_timeout)?;
    Ok(Collector::new(client, metrics))
}
