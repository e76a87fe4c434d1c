//! Metrics collection and exposition.
//!
//! # Metrics
//! - `config_sync_fetch_total` (counter): remote calls by kind, outcome
//! - `config_sync_retries_total` (counter): retried attempts by operation
//! - `config_sync_release_changes_total` (counter): applied releases by namespace
//! - `config_sync_server_addresses` (gauge): size of the server address pool
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Count one remote call.
pub fn record_fetch(kind: &'static str, outcome: &'static str) {
    metrics::counter!("config_sync_fetch_total", "kind" => kind, "outcome" => outcome).increment(1);
}

pub fn record_retry(op: &'static str) {
    metrics::counter!("config_sync_retries_total", "op" => op).increment(1);
}

pub fn record_release_change(namespace: &str) {
    metrics::counter!("config_sync_release_changes_total", "namespace" => namespace.to_string()).increment(1);
}

pub fn record_server_count(count: usize) {
    metrics::gauge!("config_sync_server_addresses").set(count as f64);
}
