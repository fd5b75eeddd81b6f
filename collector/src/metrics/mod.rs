//! Node health gauges and their text exposition.
//!
//! Typical usage:
//!
//! ```ignore
//! use std::sync::Arc;
//! use collector::metrics::MetricsRegistry;
//!
//! let metrics = Arc::new(MetricsRegistry::new("parity")?);
//!
//! // Written by the collector:
//! metrics.node.up.set(1);
//!
//! // Read by the HTTP handler:
//! let page = metrics.render();
//! ```

pub mod prometheus;

pub use self::prometheus::{Exposition, GaugeValues, MetricsRegistry, NodeGauges};
