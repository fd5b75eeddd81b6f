use axum::{
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};

use crate::state::SharedState;

/// `GET /metrics`
///
/// Serves the current gauge values in the Prometheus text format. Reads
/// whatever the last refresh left behind; never polls the node itself.
pub async fn serve_metrics(State(state): State<SharedState>) -> impl IntoResponse {
    let exposition = state.collector.metrics().render();
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, exposition.content_type)],
        exposition.body,
    )
}
