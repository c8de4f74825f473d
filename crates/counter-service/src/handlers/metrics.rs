//! Prometheus metrics endpoint handler.
//!
//! The endpoint is unauthenticated. Labels carry operational data with
//! bounded cardinality only; room names never appear.

use axum::{extract::State, response::IntoResponse};
use metrics_exporter_prometheus::PrometheusHandle;

/// Handler for GET /metrics
///
/// Returns Prometheus text format:
/// ```text
/// # TYPE cs_counter_increments_total counter
/// cs_counter_increments_total{status="success",error_type="none"} 42
/// ```
#[tracing::instrument(skip_all, name = "cs.metrics.scrape")]
pub async fn metrics_handler(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    handle.render()
}
