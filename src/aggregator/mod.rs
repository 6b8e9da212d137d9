//! Aggregator service: resolves the zip code and fetches the weather.
//!
//! # Data Flow
//! ```text
//! POST /weather {"cep": "..."}
//!     → resume trace context, span `validate-zipcode`
//!     → domain::parse_request (400 when undecodable, 422 on format)
//!     → span `request-via-cep`, viacep.rs (500 on failure, 404 when empty)
//!     → span `request-weather-api`, weatherapi.rs (500 on failure)
//!     → domain::WeatherResponse
//! ```
//!
//! The two provider calls are strictly sequential: the weather lookup needs
//! the locality from the resolution.

pub mod handler;
pub mod viacep;
pub mod weatherapi;

use std::time::Duration;

use axum::{routing::post, Router};

use crate::config::{AggregatorConfig, TimeoutConfig};
use crate::observability::trace::Telemetry;

pub use viacep::ViaCepClient;
pub use weatherapi::WeatherApiClient;

/// Application state injected into aggregator handlers.
#[derive(Clone)]
pub struct AggregatorState {
    pub telemetry: Telemetry,
    pub viacep: ViaCepClient,
    pub weather: WeatherApiClient,
    /// Budget of one inbound request, shared by both provider calls.
    pub request_timeout: Duration,
    /// Upper bound for a single provider call.
    pub upstream_timeout: Duration,
}

impl AggregatorState {
    pub fn new(
        telemetry: Telemetry,
        client: reqwest::Client,
        config: &AggregatorConfig,
        timeouts: &TimeoutConfig,
    ) -> Self {
        Self {
            telemetry,
            viacep: ViaCepClient::new(client.clone(), &config.viacep_base_url),
            weather: WeatherApiClient::new(client, &config.weather_base_url, config.weather_api_key.clone()),
            request_timeout: Duration::from_secs(timeouts.request_secs),
            upstream_timeout: Duration::from_secs(timeouts.upstream_secs),
        }
    }
}

pub fn router(state: AggregatorState) -> Router {
    Router::new()
        .route("/weather", post(handler::get_weather))
        .with_state(state)
}
