//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): total requests by method, status
//! - `proxy_request_duration_seconds` (histogram): latency distribution
//! - `proxy_cache_hits_total` / `proxy_cache_misses_total` (counters):
//!   GET lookup outcomes
//!
//! # Design Decisions
//! - Recording before `init_metrics` is a no-op, so the exporter can stay
//!   disabled in tests and minimal deployments

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a completed request with its final status.
pub fn record_request(method: &str, status: u16, start_time: Instant) {
    metrics::counter!(
        "proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("proxy_request_duration_seconds")
        .record(start_time.elapsed().as_secs_f64());
}

/// Record a GET served from the cache.
pub fn record_cache_hit() {
    metrics::counter!("proxy_cache_hits_total").increment(1);
}

/// Record a GET that fell through to the origin.
pub fn record_cache_miss() {
    metrics::counter!("proxy_cache_misses_total").increment(1);
}
