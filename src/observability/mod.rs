//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Both services produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (request counters, latency)
//!     → trace/     (spans propagated across the gateway → aggregator hop)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape, optional)
//!     → Zipkin-compatible collector (batched, off the request path)
//! ```
//!
//! # Design Decisions
//! - Structured logging via `tracing`; request IDs appear on every access log
//! - Metrics are cheap (no recorder installed means no-op)
//! - Span export failures are reported by the OpenTelemetry SDK, never
//!   surfaced to callers

pub mod logging;
pub mod metrics;
pub mod trace;
