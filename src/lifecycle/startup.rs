//! Startup orchestration.
//!
//! Fail fast: any startup error is returned to `main` before the listener
//! accepts traffic.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::aggregator::{self, AggregatorState};
use crate::config::{ServiceConfig, ServiceRole};
use crate::gateway::{self, AggregatorClient, GatewayState};
use crate::http::{build_client, HttpServer};
use crate::lifecycle::{signals, Shutdown};
use crate::observability::metrics;
use crate::observability::trace::{Telemetry, TraceInitError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid metrics address {0:?}")]
    MetricsAddress(String),

    #[error("failed to install metrics exporter")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("failed to build HTTP client")]
    Client(#[from] reqwest::Error),

    #[error("failed to set up span export")]
    Tracing(#[from] TraceInitError),

    #[error("failed to bind {address}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error")]
    Serve(#[source] std::io::Error),
}

/// Build the role's router and its telemetry.
///
/// Must run inside the tokio runtime: the span batch processor spawns its
/// export task here.
pub fn build_app(role: ServiceRole, config: &ServiceConfig) -> Result<(HttpServer, Telemetry), StartupError> {
    let telemetry = Telemetry::from_config(&config.tracing)?;
    let client = build_client(&config.timeouts)?;

    let routes = match role {
        ServiceRole::Gateway => gateway::router(GatewayState {
            telemetry: telemetry.clone(),
            aggregator: AggregatorClient::new(client, &config.gateway.aggregator_url),
            relay_upstream_status: config.gateway.relay_upstream_status,
            request_timeout: Duration::from_secs(config.timeouts.request_secs),
        }),
        ServiceRole::Aggregator => aggregator::router(AggregatorState::new(
            telemetry.clone(),
            client,
            &config.aggregator,
            &config.timeouts,
        )),
    };

    Ok((HttpServer::new(role, routes, config), telemetry))
}

/// Run `role` until SIGINT/SIGTERM.
pub async fn run(role: ServiceRole, config: ServiceConfig) -> Result<(), StartupError> {
    tracing::info!(
        service = %role,
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        "Starting"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|_| StartupError::MetricsAddress(config.observability.metrics_address.clone()))?;
        metrics::init_metrics(addr)?;
    }

    let (server, telemetry) = build_app(role, &config)?;

    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: config.listener.bind_address.clone(),
            source,
        })?;

    let shutdown = Shutdown::new();
    tokio::spawn(signals::listen(shutdown.clone()));

    let served = server.run(listener, shutdown.subscribe()).await;

    telemetry.shutdown().await;
    served.map_err(StartupError::Serve)?;

    tracing::info!(service = %role, "Shutdown complete");
    Ok(())
}
