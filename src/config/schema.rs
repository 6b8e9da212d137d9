//! Configuration schema definitions.
//!
//! One structure serves both services; each role reads the sections it
//! needs. All types derive Serde traits for deserialization from TOML.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which of the two services this process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceRole {
    /// Public entry point; validates and forwards.
    Gateway,
    /// Resolves the address and fetches the weather.
    Aggregator,
}

impl ServiceRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceRole::Gateway => "gateway",
            ServiceRole::Aggregator => "aggregator",
        }
    }

    pub fn default_bind_address(&self) -> &'static str {
        match self {
            ServiceRole::Gateway => "0.0.0.0:8080",
            ServiceRole::Aggregator => "0.0.0.0:8081",
        }
    }
}

impl fmt::Display for ServiceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration.
    pub listener: ListenerConfig,

    /// Gateway → aggregator forwarding.
    pub gateway: GatewayConfig,

    /// External providers used by the aggregator.
    pub aggregator: AggregatorConfig,

    /// Span creation and export.
    pub tracing: TracingConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,
}

impl ServiceConfig {
    /// Defaults for `role`, before any file or environment is applied.
    pub fn for_role(role: ServiceRole) -> Self {
        let mut config = Self::default();
        config.apply_role_defaults(role);
        config
    }

    /// Fill role-dependent fields left empty.
    pub fn apply_role_defaults(&mut self, role: ServiceRole) {
        if self.listener.bind_address.trim().is_empty() {
            self.listener.bind_address = role.default_bind_address().to_string();
        }
        if self.tracing.service_name.trim().is_empty() {
            self.tracing.service_name = role.as_str().to_string();
        }
    }

    /// Override fields from environment-style variables.
    ///
    /// `lookup` is `std::env::var` in production; tests pass a map.
    /// Empty values are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("URL_SERVICE_B") {
            self.gateway.aggregator_url = v;
        }
        if let Some(v) = get("URL_ZIPKIN") {
            self.tracing.collector_url = v;
        }
        if let Some(v) = get("WEATHER_API_KEY") {
            self.aggregator.weather_api_key = v;
        }
        if let Some(v) = get("VIACEP_BASE_URL") {
            self.aggregator.viacep_base_url = v;
        }
        if let Some(v) = get("WEATHER_API_BASE_URL") {
            self.aggregator.weather_base_url = v;
        }
        if let Some(v) = get("BIND_ADDRESS") {
            self.listener.bind_address = v;
        }
        if let Some(v) = get("LOG_LEVEL") {
            self.observability.log_level = v;
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080"). Empty means the role default.
    pub bind_address: String,
}

/// Gateway forwarding settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Base URL of the aggregator; `/weather` is appended.
    pub aggregator_url: String,

    /// Relay the aggregator's non-200 status and body as-is. When false,
    /// every non-200 answer is reported as 422 "zipcode invalido".
    pub relay_upstream_status: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            aggregator_url: "http://localhost:8081".to_string(),
            relay_upstream_status: true,
        }
    }
}

/// External providers used by the aggregator.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Postal-code resolution provider base URL.
    pub viacep_base_url: String,

    /// Weather provider base URL; `/current.json` is appended.
    pub weather_base_url: String,

    /// Weather provider API key. Required for the aggregator.
    pub weather_api_key: String,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            viacep_base_url: "http://viacep.com.br".to_string(),
            weather_base_url: "http://api.weatherapi.com/v1".to_string(),
            weather_api_key: String::new(),
        }
    }
}

/// Span creation and export.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TracingConfig {
    /// Export spans at all.
    pub enabled: bool,

    /// Zipkin collector base URL (e.g., "http://zipkin:9411"). Empty disables export.
    pub collector_url: String,

    /// Service name reported to the collector. Empty means the role name.
    pub service_name: String,

    /// Service version reported to the collector.
    pub service_version: String,

    /// Fraction of new traces to sample (0.0 - 1.0). Resumed traces keep
    /// the caller's decision.
    pub sample_ratio: f64,

    /// Bounded queue between request workers and the export task.
    pub max_queue_size: usize,

    /// Spans per export request.
    pub max_export_batch_size: usize,

    /// Export interval in milliseconds.
    pub scheduled_delay_ms: u64,

    /// Deadline for one export request in milliseconds.
    pub export_timeout_ms: u64,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            collector_url: String::new(),
            service_name: String::new(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            sample_ratio: 1.0,
            max_queue_size: 2048,
            max_export_batch_size: 512,
            scheduled_delay_ms: 5000,
            export_timeout_ms: 30_000,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout for outbound calls, in seconds.
    pub connect_secs: u64,

    /// Deadline for one outbound call (connect + response), in seconds.
    pub upstream_secs: u64,

    /// Deadline for handling one inbound request, in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            upstream_secs: 10,
            request_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
