//! Prometheus metrics for monitoring tournament server activity.
//!
//! Metrics are exposed in Prometheus text format for scraping by monitoring
//! systems when an exporter address is configured.
//!
//! # Metrics Categories
//!
//! - **HTTP Metrics**: Request counts and duration by route and status
//! - **Tournament Metrics**: Structures generated, results reported, registrations
//! - **Error Metrics**: Failed operations by error code
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use tourney_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::structures_generated_total("single-elimination");
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tourney::tournament::ErrorCode;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
///
/// # Arguments
///
/// - `addr`: Address to bind the metrics server to (e.g., `0.0.0.0:9090`)
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Record HTTP request.
pub fn http_requests_total(method: &str, path: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record HTTP request duration in milliseconds.
pub fn http_request_duration_ms(method: &str, path: &str, duration_ms: f64) {
    metrics::histogram!("http_request_duration_ms",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_ms);
}

// ============================================================================
// Tournament Metrics
// ============================================================================

/// Increment generated structures counter.
pub fn structures_generated_total(format: &str) {
    metrics::counter!("tournament_structures_generated_total",
        "format" => format.to_string()
    )
    .increment(1);
}

/// Increment reported results counter.
pub fn results_reported_total(format: &str, decided_tournament: bool) {
    metrics::counter!("tournament_results_reported_total",
        "format" => format.to_string(),
        "decided_tournament" => decided_tournament.to_string()
    )
    .increment(1);
}

/// Increment successful registrations counter.
pub fn registrations_total() {
    metrics::counter!("tournament_registrations_total").increment(1);
}

/// Increment failed operations counter.
///
/// `aborted` failures are transactions that kept losing commit races.
pub fn operation_errors_total(operation: &str, code: ErrorCode) {
    metrics::counter!("tournament_operation_errors_total",
        "operation" => operation.to_string(),
        "code" => code.to_string()
    )
    .increment(1);
}
