//! Shared application state.

use std::sync::Arc;

use collector::DefaultCollector;

/// Shared state held by the HTTP handlers and the refresh loop.
///
/// This is wrapped in an [`Arc`] and passed to request handlers via Axum's
/// `State` extractor. The collector owns the metrics registry; handlers
/// reach it through [`collector::Collector::metrics`].
pub struct AppState {
    /// Collector driven by the refresh loop.
    pub collector: DefaultCollector,
}

/// Thread-safe alias for `AppState`.
pub type SharedState = Arc<AppState>;
