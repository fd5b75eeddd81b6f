use std::time::UNIX_EPOCH;

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use collector::{LastRefresh, RefreshOutcome};

use crate::state::SharedState;

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Current value of the `up` gauge.
    pub node_up: bool,
    /// Most recent refresh cycle; `null` until the first one completes.
    pub last_refresh: Option<LastRefreshDto>,
}

#[derive(Debug, Serialize)]
pub struct LastRefreshDto {
    pub outcome: RefreshOutcome,
    /// Completion time as seconds since the Unix epoch.
    pub unix_secs: u64,
}

impl From<LastRefresh> for LastRefreshDto {
    fn from(last: LastRefresh) -> Self {
        Self {
            outcome: last.outcome,
            unix_secs: last
                .finished_at
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
        }
    }
}

/// `GET /health`
///
/// The exporter is alive whenever it answers; the node's state and the
/// last refresh are reported alongside for quick diagnosis.
pub async fn health(State(state): State<SharedState>) -> (StatusCode, Json<HealthResponse>) {
    let collector = &state.collector;
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            node_up: collector.metrics().node.up.get() == 1,
            last_refresh: collector.last_refresh().map(LastRefreshDto::from),
        }),
    )
}
