//! Configuration validation.
//!
//! Serde handles syntax; this checks values against the role that will run.
//! All problems are reported at once, not just the first.

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::{ServiceConfig, ServiceRole};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub fn validate_config(config: &ServiceConfig, role: ServiceRole) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("{:?} is not a socket address", config.listener.bind_address),
        ));
    }

    match role {
        ServiceRole::Gateway => {
            check_http_url(&mut errors, "gateway.aggregator_url", &config.gateway.aggregator_url);
        }
        ServiceRole::Aggregator => {
            check_http_url(&mut errors, "aggregator.viacep_base_url", &config.aggregator.viacep_base_url);
            check_http_url(&mut errors, "aggregator.weather_base_url", &config.aggregator.weather_base_url);
            if config.aggregator.weather_api_key.trim().is_empty() {
                errors.push(ValidationError::new(
                    "aggregator.weather_api_key",
                    "required (set WEATHER_API_KEY)",
                ));
            }
        }
    }

    let tracing = &config.tracing;
    if tracing.enabled && !tracing.collector_url.trim().is_empty() {
        check_http_url(&mut errors, "tracing.collector_url", &tracing.collector_url);
    }
    if !(0.0..=1.0).contains(&tracing.sample_ratio) {
        errors.push(ValidationError::new("tracing.sample_ratio", "must be within 0.0..=1.0"));
    }
    if tracing.max_export_batch_size == 0 {
        errors.push(ValidationError::new("tracing.max_export_batch_size", "must be > 0"));
    }
    if tracing.max_queue_size < tracing.max_export_batch_size {
        errors.push(ValidationError::new(
            "tracing.max_queue_size",
            "must be at least tracing.max_export_batch_size",
        ));
    }
    if tracing.scheduled_delay_ms == 0 {
        errors.push(ValidationError::new("tracing.scheduled_delay_ms", "must be > 0"));
    }
    if tracing.export_timeout_ms == 0 {
        errors.push(ValidationError::new("tracing.export_timeout_ms", "must be > 0"));
    }

    let timeouts = &config.timeouts;
    for (field, value) in [
        ("timeouts.connect_secs", timeouts.connect_secs),
        ("timeouts.upstream_secs", timeouts.upstream_secs),
        ("timeouts.request_secs", timeouts.request_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::new(field, "must be > 0"));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "is not a socket address",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_http_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {}
        Ok(_) => errors.push(ValidationError::new(field, format!("{value:?} is not an http(s) URL"))),
        Err(e) => errors.push(ValidationError::new(field, format!("{value:?}: {e}"))),
    }
}
