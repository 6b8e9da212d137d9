//! W3C trace-context and baggage over HTTP headers.
//!
//! Both directions go through a composite of the SDK's
//! `TraceContextPropagator` and `BaggagePropagator`, so `traceparent`,
//! `tracestate` and `baggage` travel together.

use axum::http::HeaderMap;
use opentelemetry::propagation::{TextMapCompositePropagator, TextMapPropagator};
use opentelemetry::Context;
use opentelemetry_http::{HeaderExtractor, HeaderInjector};
use opentelemetry_sdk::propagation::{BaggagePropagator, TraceContextPropagator};

fn propagator() -> TextMapCompositePropagator {
    TextMapCompositePropagator::new(vec![
        Box::new(TraceContextPropagator::new()),
        Box::new(BaggagePropagator::new()),
    ])
}

/// The caller's trace and baggage, resolved against an empty context.
///
/// Missing or malformed `traceparent` yields a context without a span, so
/// the first span started from it opens a new trace.
pub fn extract(headers: &HeaderMap) -> Context {
    propagator().extract_with_context(&Context::new(), &HeaderExtractor(headers))
}

/// Write the span and baggage of `cx` into `headers`.
pub fn inject(cx: &Context, headers: &mut HeaderMap) {
    propagator().inject_context(cx, &mut HeaderInjector(headers));
}
