//! Gateway service: validates the zip code and forwards to the aggregator.
//!
//! # Data Flow
//! ```text
//! POST /weather {"cep": "..."}
//!     → extract trace context, span `validate-zipcode`
//!     → domain::parse_request (400 / 422 on failure)
//!     → span `request-service-b`, forward.rs (inject trace context)
//!     → relay the aggregator's answer
//! ```

pub mod forward;
pub mod handler;

use std::time::Duration;

use axum::{routing::post, Router};

use crate::observability::trace::Telemetry;

pub use forward::{AggregatorClient, AggregatorReply};

/// Application state injected into gateway handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub telemetry: Telemetry,
    pub aggregator: AggregatorClient,
    /// Relay non-200 answers as-is instead of collapsing them to 422.
    pub relay_upstream_status: bool,
    /// Budget of one inbound request; the aggregator hop gets what is left.
    pub request_timeout: Duration,
}

pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/weather", post(handler::get_weather))
        .with_state(state)
}
