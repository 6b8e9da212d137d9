//! Metrics collection and exposition.
//!
//! # Metrics
//! - `cep_weather_requests_total` (counter): requests by service, status
//! - `cep_weather_request_duration_seconds` (histogram): latency by service
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(service: &'static str, status: u16, start: Instant) {
    ::metrics::counter!(
        "cep_weather_requests_total",
        "service" => service,
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!("cep_weather_request_duration_seconds", "service" => service)
        .record(start.elapsed().as_secs_f64());
}
