//! Metrics definitions for the counter service.
//!
//! All metrics follow Prometheus naming conventions:
//! - `cs_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded. Room names never appear as label values:
//! - `endpoint`: the four known routes plus `/other`
//! - `status`: success, error, timeout
//! - `operation`: list_rooms, create_room, update_room_metadata
//! - `error_type`: bounded by `CounterError` variants

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Install the Prometheus recorder and return the handle used to render
/// `/metrics`.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns error if the recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("cs_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.200, 0.500, 1.000, 2.500, 5.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        // Includes lock wait, so the tail reaches the lock wait timeout.
        .set_buckets_for_metric(
            Matcher::Prefix("cs_counter_increment".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000, 10.000,
            ],
        )
        .map_err(|e| format!("Failed to set counter increment buckets: {e}"))?
        .set_buckets_for_metric(
            Matcher::Prefix("cs_upstream_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.200, 0.500, 1.000, 2.000, 5.000,
            ],
        )
        .map_err(|e| format!("Failed to set upstream request buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion
///
/// Metric: `cs_http_requests_total`, `cs_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status`
///
/// Captures framework-level rejections (404, 405, 415) as well as handler
/// responses.
pub fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    let normalized_endpoint = normalize_endpoint(endpoint);
    let status = categorize_status_code(status_code);

    histogram!("cs_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("cs_http_requests_total",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

/// Categorize HTTP status code into success/error/timeout
fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=299 => "success",
        408 | 504 => "timeout",
        _ => "error",
    }
}

/// Normalize endpoint path to prevent label cardinality explosion
fn normalize_endpoint(path: &str) -> &'static str {
    match path {
        "/" => "/",
        "/create-room" => "/create-room",
        "/counter-increment" => "/counter-increment",
        "/metrics" => "/metrics",
        _ => "/other",
    }
}

// ============================================================================
// Counter Protocol Metrics
// ============================================================================

/// Record one increment attempt.
///
/// Metric: `cs_counter_increments_total`, `cs_counter_increment_duration_seconds`
/// Labels: `status`, `error_type`
///
/// Duration includes time spent waiting for the room lock.
pub fn record_counter_increment(status: &str, error_type: Option<&str>, duration: Duration) {
    histogram!("cs_counter_increment_duration_seconds",
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("cs_counter_increments_total",
        "status" => status.to_string(),
        "error_type" => error_type.unwrap_or("none").to_string()
    )
    .increment(1);
}

/// Set the number of rooms with a live lock entry.
///
/// Metric: `cs_room_locks_active`
pub fn set_room_locks_active(count: usize) {
    #[allow(clippy::cast_precision_loss)]
    gauge!("cs_room_locks_active").set(count as f64);
}

// ============================================================================
// Upstream Room Service Metrics
// ============================================================================

/// Record an upstream room service call.
///
/// Metric: `cs_upstream_request_duration_seconds`, `cs_upstream_requests_total`
/// Labels: `operation`, `status`
pub fn record_upstream_request(operation: &str, status: &str, duration: Duration) {
    histogram!("cs_upstream_request_duration_seconds",
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("cs_upstream_requests_total",
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

// ============================================================================
// Room Creation Metrics
// ============================================================================

/// Record a room creation attempt.
///
/// Metric: `cs_rooms_created_total`
/// Labels: `status`
pub fn record_room_created(status: &str) {
    counter!("cs_rooms_created_total",
        "status" => status.to_string()
    )
    .increment(1);
}
