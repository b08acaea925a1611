//! Metrics definitions for the Token Gateway.
//!
//! All metrics follow Prometheus naming conventions:
//! - `tg_` prefix for Token Gateway
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded to prevent cardinality explosion:
//! - `method`: HTTP methods seen by the router
//! - `endpoint`: the fixed route set, `/static/{path}`, or `/other`
//! - `grant`: 3 values (viewer, publisher, room_list)
//! - `outcome`: 4 values (permit, permit_unchecked, room_not_found, room_occupied)
//! - `status`: success or an upstream failure class

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize the Prometheus recorder and return the handle used by
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
            Matcher::Prefix("tg_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.200, 0.500, 1.000, 2.000, 5.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        // Upstream calls are bounded by the admission timeout (default 5s)
        .set_buckets_for_metric(
            Matcher::Prefix("tg_upstream_request".to_string()),
            &[
                0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000, 10.000,
            ],
        )
        .map_err(|e| format!("Failed to set upstream request buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion.
///
/// Metric: `tg_http_requests_total`, `tg_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status` / `status_code`
pub fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    let normalized_endpoint = normalize_endpoint(endpoint);
    let status = categorize_status_code(status_code);

    histogram!("tg_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint.to_string(),
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("tg_http_requests_total",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint.to_string(),
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=299 => "success",
        408 | 504 => "timeout",
        _ => "error",
    }
}

/// Map a request path onto a bounded label set.
fn normalize_endpoint(path: &str) -> &'static str {
    match path {
        "/" => "/",
        "/test" => "/test",
        "/health" => "/health",
        "/metrics" => "/metrics",
        "/api/token" => "/api/token",
        "/api/publisher-token" => "/api/publisher-token",
        "/api/devices" => "/api/devices",
        "/favicon.ico" => "/favicon.ico",
        "/sw.js" => "/sw.js",
        "/apple-touch-icon.png" | "/apple-touch-icon-precomposed.png" => "/apple-touch-icon",
        p if p.starts_with("/static/") => "/static/{path}",
        _ => "/other",
    }
}

// ============================================================================
// Token Metrics
// ============================================================================

/// Record a signed token.
///
/// Metric: `tg_tokens_issued_total`
/// Labels: `grant` (viewer, publisher, room_list)
pub fn record_token_issued(grant: &str) {
    counter!("tg_tokens_issued_total",
        "grant" => grant.to_string()
    )
    .increment(1);
}

/// Record a publisher admission decision.
///
/// Metric: `tg_admission_decisions_total`
/// Labels: `outcome`
pub fn record_admission_decision(outcome: &str) {
    counter!("tg_admission_decisions_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

// ============================================================================
// Upstream Metrics
// ============================================================================

/// Record an upstream room-list call.
///
/// Metric: `tg_upstream_requests_total`, `tg_upstream_request_duration_seconds`
/// Labels: `status` ("success" or an `UpstreamError` kind)
pub fn record_upstream_request(status: &str, duration: Duration) {
    histogram!("tg_upstream_request_duration_seconds",
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("tg_upstream_requests_total",
        "status" => status.to_string()
    )
    .increment(1);
}
