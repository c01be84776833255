//! Metrics collection and exposition.
//!
//! # Metrics
//! - `cluster_requests_total` (counter): proxied requests by worker, status
//! - `cluster_request_duration_seconds` (histogram): time to response head
//! - `cluster_proxy_errors_total` (counter): upstream failures by worker
//! - `cluster_worker_exits_total` (counter): worker process exits
//! - `cluster_worker_spawn_failures_total` (counter): failed launches
//! - `cluster_worker_up` (gauge): 1 = accepting connections, 0 = down

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder with an HTTP scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a request that got a response from a worker (or a synthesized one).
pub fn record_request(worker: usize, status: u16, start: Instant) {
    let worker = worker.to_string();
    metrics::counter!(
        "cluster_requests_total",
        "worker" => worker.clone(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("cluster_request_duration_seconds", "worker" => worker)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_proxy_error(worker: usize) {
    metrics::counter!("cluster_proxy_errors_total", "worker" => worker.to_string()).increment(1);
}

pub fn record_worker_exit(worker: usize) {
    metrics::counter!("cluster_worker_exits_total", "worker" => worker.to_string()).increment(1);
}

pub fn record_spawn_failure(worker: usize) {
    metrics::counter!("cluster_worker_spawn_failures_total", "worker" => worker.to_string())
        .increment(1);
}

pub fn set_worker_up(worker: usize, up: bool) {
    metrics::gauge!("cluster_worker_up", "worker" => worker.to_string()).set(if up { 1.0 } else { 0.0 });
}
