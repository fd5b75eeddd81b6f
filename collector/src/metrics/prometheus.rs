//! Prometheus-backed node gauges and text exposition.
//!
//! This module defines [`NodeGauges`], the fixed set of gauges the
//! collector writes, and [`MetricsRegistry`], which owns a Prometheus
//! registry holding them and renders the text exposition format.

use prometheus::{self, Encoder, IntGauge, IntGaugeVec, Opts, Registry, TextEncoder};

/// Label carried by the string-valued gauges (`version`, `enode_address`).
pub const VALUE_LABEL: &str = "value";

/// Gauges describing the health of one node.
///
/// Scalar gauges hold the last value written. `version` and
/// `enode_address` carry their payload in the `value` label and always
/// hold at most one series set to 1.
#[derive(Clone)]
pub struct NodeGauges {
    /// Client version string, e.g. `Parity/v2.5.0`.
    pub version: IntGaugeVec,
    pub connected_peers: IntGauge,
    pub active_peers: IntGauge,
    pub max_peers: IntGauge,
    /// Blocks behind the latest block of the network (0 when synced).
    pub sync_status: IntGauge,
    pub current_block: IntGauge,
    /// 1 when the node answered `web3_clientVersion`, 0 otherwise.
    pub up: IntGauge,
    /// Node address (enode URL).
    pub enode_address: IntGaugeVec,
}

impl NodeGauges {
    /// Registers the node gauges into the given `Registry`.
    pub fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        let version = IntGaugeVec::new(Opts::new("version", "Client version"), &[VALUE_LABEL])?;
        registry.register(Box::new(version.clone()))?;

        let connected_peers = int_gauge(registry, "connected_peers", "Connected Peers")?;
        let active_peers = int_gauge(registry, "active_peers", "Active Peers")?;
        let max_peers = int_gauge(registry, "max_peers", "Maximum Peers")?;
        let sync_status = int_gauge(
            registry,
            "sync_status",
            "Blocks behind the latest block of the network",
        )?;
        let current_block = int_gauge(registry, "current_block", "Current Block of the node")?;
        let up = int_gauge(registry, "up", "Node up/down")?;

        let enode_address = IntGaugeVec::new(
            Opts::new("enode_address", "Ethereum Node Address (enode URL)"),
            &[VALUE_LABEL],
        )?;
        registry.register(Box::new(enode_address.clone()))?;

        Ok(Self {
            version,
            connected_peers,
            active_peers,
            max_peers,
            sync_status,
            current_block,
            up,
            enode_address,
        })
    }

    /// Replaces the version series with one labelled `version`.
    pub fn set_version(&self, version: &str) {
        set_single_label(&self.version, version);
    }

    /// Replaces the enode series with one labelled `enode`.
    pub fn set_enode_address(&self, enode: &str) {
        set_single_label(&self.enode_address, enode);
    }

    /// Reads back the current gauge state.
    pub fn values(&self) -> GaugeValues {
        GaugeValues {
            up: self.up.get(),
            version: current_label(&self.version),
            connected_peers: self.connected_peers.get(),
            active_peers: self.active_peers.get(),
            max_peers: self.max_peers.get(),
            sync_status: self.sync_status.get(),
            current_block: self.current_block.get(),
            enode_address: current_label(&self.enode_address),
        }
    }
}

fn int_gauge(registry: &Registry, name: &str, help: &str) -> Result<IntGauge, prometheus::Error> {
    let gauge = IntGauge::with_opts(Opts::new(name, help))?;
    registry.register(Box::new(gauge.clone()))?;
    Ok(gauge)
}

/// Leaves the vector alone when it already holds exactly this one series,
/// so an unchanged label never disappears from a scrape.
fn set_single_label(vec: &IntGaugeVec, value: &str) {
    if series(vec) == [(value.to_string(), 1)] {
        return;
    }
    vec.reset();
    vec.with_label_values(&[value]).set(1);
}

fn series(vec: &IntGaugeVec) -> Vec<(String, i64)> {
    use prometheus::core::Collector;

    vec.collect()
        .iter()
        .flat_map(|family| family.get_metric())
        .filter_map(|metric| {
            let label = metric
                .get_label()
                .iter()
                .find(|pair| pair.get_name() == VALUE_LABEL)?;
            Some((
                label.get_value().to_string(),
                metric.get_gauge().get_value() as i64,
            ))
        })
        .collect()
}

fn current_label(vec: &IntGaugeVec) -> Option<String> {
    series(vec)
        .into_iter()
        .find(|(_, value)| *value != 0)
        .map(|(label, _)| label)
}

/// Point-in-time copy of [`NodeGauges`], comparable in tests and cheap to
/// hand to other components.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GaugeValues {
    pub up: i64,
    pub version: Option<String>,
    pub connected_peers: i64,
    pub active_peers: i64,
    pub max_peers: i64,
    pub sync_status: i64,
    pub current_block: i64,
    pub enode_address: Option<String>,
}

/// Rendered metrics page: the body plus the content type to serve it with.
#[derive(Clone, Debug)]
pub struct Exposition {
    pub content_type: String,
    pub body: String,
}

/// Wrapper around a Prometheus registry and the node gauges.
///
/// Constructed once and shared in an [`std::sync::Arc`] between the
/// collector that writes the gauges and the HTTP handler that renders them.
#[derive(Clone)]
pub struct MetricsRegistry {
    registry: Registry,
    pub node: NodeGauges,
}

impl MetricsRegistry {
    /// Creates a registry whose metric names are prefixed with
    /// `namespace` (no prefix when empty) and registers the node gauges.
    pub fn new(namespace: &str) -> Result<Self, prometheus::Error> {
        let prefix = (!namespace.is_empty()).then(|| namespace.to_string());
        let registry = Registry::new_custom(prefix, None)?;
        let node = NodeGauges::register(&registry)?;
        Ok(Self { registry, node })
    }

    /// Encodes all metrics in this registry into the Prometheus text format.
    ///
    /// Only reads gauge state; never triggers a refresh.
    pub fn render(&self) -> Exposition {
        let encoder = TextEncoder::new();
        let content_type = encoder.format_type().to_string();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::error!(error = %e, "failed to encode Prometheus metrics");
            return Exposition {
                content_type,
                body: String::new(),
            };
        }
        Exposition {
            content_type,
            body: String::from_utf8(buffer).unwrap_or_default(),
        }
    }
}
