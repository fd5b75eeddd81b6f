//! Collector configuration.
//!
//! A single [`CollectorConfig`] describes which node to poll, how long a
//! JSON-RPC call may take, how often the refresh loop ticks and which
//! namespace prefixes the exported metric names. Binaries construct it
//! from defaults, CLI flags or environment variables as needed.

use std::time::Duration;

use thiserror::Error;

/// Errors reported by [`CollectorConfig::validate`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("node URL must not be empty")]
    EmptyNodeUrl,
    #[error("node URL `{0}` must start with http:// or https://")]
    UnsupportedScheme(String),
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
    #[error("invalid metric namespace `{0}`")]
    InvalidNamespace(String),
}

/// Configuration for one collector bound to one node endpoint.
#[derive(Clone, Debug)]
pub struct CollectorConfig {
    /// JSON-RPC endpoint of the node, e.g. `"http://127.0.0.1:8545"`.
    pub node_url: String,
    /// Per-request timeout applied by the HTTP transport.
    pub rpc_timeout: Duration,
    /// Interval between two refresh cycles.
    pub poll_interval: Duration,
    /// Prefix joined to every metric name with an underscore.
    pub namespace: String,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            node_url: "http://127.0.0.1:8545".to_string(),
            rpc_timeout: Duration::from_secs(5),
            poll_interval: Duration::from_secs(15),
            namespace: "parity".to_string(),
        }
    }
}

impl CollectorConfig {
    /// Checks the values a misconfigured deployment would otherwise only
    /// discover on the first scrape.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.node_url.trim();
        if url.is_empty() {
            return Err(ConfigError::EmptyNodeUrl);
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::UnsupportedScheme(url.to_string()));
        }
        if self.rpc_timeout.is_zero() {
            return Err(ConfigError::ZeroDuration("rpc_timeout"));
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroDuration("poll_interval"));
        }
        if !is_valid_namespace(&self.namespace) {
            return Err(ConfigError::InvalidNamespace(self.namespace.clone()));
        }
        Ok(())
    }
}

/// Prometheus metric names match `[a-zA-Z_:][a-zA-Z0-9_:]*`; an empty
/// namespace means "no prefix".
fn is_valid_namespace(ns: &str) -> bool {
    let mut chars = ns.chars();
    match chars.next() {
        None => true,
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
        }
        Some(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = CollectorConfig::default();
        assert_eq!(cfg.validate(), Ok(()));
        assert_eq!(cfg.namespace, "parity");
    }

    #[test]
    fn rejects_bad_urls() {
        let mut cfg = CollectorConfig {
            node_url: "   ".to_string(),
            ..Default::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::EmptyNodeUrl));

        cfg.node_url = "ws://127.0.0.1:8546".to_string();
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::UnsupportedScheme(_))
        ));

        cfg.node_url = "https://rpc.example.org".to_string();
        assert_eq!(cfg.validate(), Ok(()));
    }

    #[test]
    fn rejects_zero_durations() {
        let cfg = CollectorConfig {
            poll_interval: Duration::ZERO,
            ..Default::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::ZeroDuration("poll_interval"))
        );
    }

    #[test]
    fn namespace_rules() {
        assert!(is_valid_namespace(""));
        assert!(is_valid_namespace("parity"));
        assert!(is_valid_namespace("eth_node:1"));
        assert!(!is_valid_namespace("1parity"));
        assert!(!is_valid_namespace("parity-node"));
    }
}
