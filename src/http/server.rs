//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Wrap a role router with the shared middleware (request id, access log, timeout, metrics)
//! - Serve `GET /health`
//! - Bind the server to a listener and drain on shutdown

use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{ServiceConfig, ServiceRole};
use crate::http::request::{request_id, UuidRequestId};
use crate::observability::metrics;

/// HTTP server for one service role.
pub struct HttpServer {
    role: ServiceRole,
    router: Router,
}

impl HttpServer {
    /// Wrap `routes` (state already applied) with the shared layers.
    pub fn new(role: ServiceRole, routes: Router, config: &ServiceConfig) -> Self {
        let router = Self::build_router(role, routes, config);
        Self { role, router }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Layers run outside-in in reverse order of the `.layer` calls: the
    /// request id is set first so the access log and handlers can see it.
    #[allow(deprecated)]
    fn build_router(role: ServiceRole, routes: Router, config: &ServiceConfig) -> Router {
        routes
            .route("/health", get(health))
            .layer(middleware::from_fn_with_state(role, track_requests))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(move |request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    service = role.as_str(),
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = request_id(request.headers()).unwrap_or("-"),
                )
            }))
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
    }

    /// The fully layered router, for serving on a custom transport.
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            service = %self.role,
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!(service = %self.role, "HTTP server stopped");
        Ok(())
    }
}

async fn health() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

async fn track_requests(State(role): State<ServiceRole>, request: Request, next: Next) -> Response {
    let start = Instant::now();
    let response = next.run(request).await;
    metrics::record_request(role.as_str(), response.status().as_u16(), start);
    response
}
