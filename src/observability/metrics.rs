//! Metrics collection and exposition.
//!
//! # Metrics
//! - `spillway_connections_total` (counter): accepted connections
//! - `spillway_active_connections` (gauge): live sessions
//! - `spillway_requests_total` (counter): request heads read, by method
//! - `spillway_responses_total` (counter): responses sent, by status and framing
//! - `spillway_spilled_bytes_total` (counter): body bytes written to disk
//! - `spillway_chunk_bytes_total` (counter): bytes sent in response chunks

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_connection_opened() {
    ::metrics::counter!("spillway_connections_total").increment(1);
    ::metrics::gauge!("spillway_active_connections").increment(1.0);
}

pub fn record_connection_closed() {
    ::metrics::gauge!("spillway_active_connections").decrement(1.0);
}

pub fn record_request(method: &str) {
    ::metrics::counter!("spillway_requests_total", "method" => method.to_string()).increment(1);
}

pub fn record_response(status: u16, chunked: bool) {
    let framing = if chunked { "chunked" } else { "fixed" };
    ::metrics::counter!(
        "spillway_responses_total",
        "status" => status.to_string(),
        "framing" => framing
    )
    .increment(1);
}

pub fn record_spill(bytes: u64) {
    ::metrics::counter!("spillway_spilled_bytes_total").increment(bytes);
}

pub fn record_chunk(bytes: usize) {
    ::metrics::counter!("spillway_chunk_bytes_total").increment(bytes as u64);
}
