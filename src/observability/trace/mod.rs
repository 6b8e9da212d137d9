//! Distributed tracing on the OpenTelemetry SDK.
//!
//! # Data Flow
//! ```text
//! inbound headers ──extract──▶ Context ──▶ Telemetry::start ──▶ Context + span
//!                                                                  │
//! outbound headers ◀──inject── child Context                       │ end / drop
//!                                                                  ▼
//!                    BatchSpanProcessor (bounded queue, tokio task)
//!                                                                  │
//!                                                                  ▼
//!                                   ZipkinExporter (JSON v2 over HTTP)
//! ```
//!
//! The provider is built once at startup and cloned into each service's
//! state. Nothing is registered with `opentelemetry::global`: handlers pass
//! contexts explicitly and inject/extract through [`propagation`].

pub mod propagation;

use std::error::Error as StdError;
use std::time::Duration;

use opentelemetry::trace::{SpanKind, Status, TraceContextExt, Tracer as _, TracerProvider as _};
use opentelemetry::{Context, KeyValue};
use opentelemetry_sdk::runtime;
use opentelemetry_sdk::trace::span_processor_with_async_runtime::BatchSpanProcessor;
use opentelemetry_sdk::trace::{BatchConfigBuilder, Sampler, SdkTracer, SdkTracerProvider, SpanExporter};
use opentelemetry_sdk::Resource;
use opentelemetry_zipkin::ZipkinExporter;
use thiserror::Error;

use crate::config::TracingConfig;

/// Zipkin v2 ingestion path, appended to the collector base URL.
pub const SPANS_PATH: &str = "/api/v2/spans";

#[derive(Debug, Error)]
pub enum TraceInitError {
    #[error("failed to build the span export client")]
    Client(#[from] reqwest::Error),

    #[error("failed to build the Zipkin exporter: {0}")]
    Exporter(String),
}

/// Owns the tracer provider and hands out spans.
///
/// Cheap to clone; every clone shares one export pipeline.
#[derive(Debug, Clone)]
pub struct Telemetry {
    provider: SdkTracerProvider,
    tracer: SdkTracer,
    service_name: String,
}

impl Telemetry {
    /// Build the pipeline described by `config`: batched Zipkin export when
    /// tracing is enabled and a collector URL is set. Otherwise spans are
    /// still created and propagated but never leave the process.
    pub fn from_config(config: &TracingConfig) -> Result<Self, TraceInitError> {
        if !config.enabled || config.collector_url.trim().is_empty() {
            tracing::info!(service = %config.service_name, "Span export disabled");
            let provider = SdkTracerProvider::builder()
                .with_resource(resource(config))
                .with_sampler(sampler(config))
                .build();
            return Ok(Self::new(provider, config));
        }

        let endpoint = collector_endpoint(&config.collector_url);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.export_timeout_ms))
            .build()?;
        let exporter = ZipkinExporter::builder()
            .with_collector_endpoint(endpoint.clone())
            .with_http_client(client)
            .build()
            .map_err(|e| TraceInitError::Exporter(e.to_string()))?;

        let batch = BatchConfigBuilder::default()
            .with_max_queue_size(config.max_queue_size)
            .with_max_export_batch_size(config.max_export_batch_size)
            .with_scheduled_delay(Duration::from_millis(config.scheduled_delay_ms))
            .build();
        let processor = BatchSpanProcessor::builder(exporter, runtime::Tokio)
            .with_batch_config(batch)
            .build();

        tracing::info!(
            service = %config.service_name,
            endpoint = %endpoint,
            "Exporting spans to Zipkin"
        );

        let provider = SdkTracerProvider::builder()
            .with_resource(resource(config))
            .with_sampler(sampler(config))
            .with_span_processor(processor)
            .build();
        Ok(Self::new(provider, config))
    }

    /// Hand every span to `exporter` synchronously as it ends.
    pub fn with_simple_exporter<E>(exporter: E, config: &TracingConfig) -> Self
    where
        E: SpanExporter + 'static,
    {
        let provider = SdkTracerProvider::builder()
            .with_resource(resource(config))
            .with_sampler(sampler(config))
            .with_simple_exporter(exporter)
            .build();
        Self::new(provider, config)
    }

    fn new(provider: SdkTracerProvider, config: &TracingConfig) -> Self {
        Self {
            tracer: provider.tracer(env!("CARGO_PKG_NAME")),
            provider,
            service_name: config.service_name.clone(),
        }
    }

    /// Start `name` under the span carried by `parent`.
    ///
    /// A parent without a span (no or malformed inbound headers) starts a
    /// new trace. The returned context owns the span; it ends on
    /// `cx.span().end()` or when the last clone of the context is dropped,
    /// whichever comes first, and never twice.
    pub fn start(&self, name: &'static str, kind: SpanKind, parent: &Context) -> Context {
        let span = self
            .tracer
            .span_builder(name)
            .with_kind(kind)
            .start_with_context(&self.tracer, parent);
        parent.with_span(span)
    }

    /// Export whatever is queued. Blocks a pool thread, not the runtime.
    pub async fn force_flush(&self) {
        let provider = self.provider.clone();
        match tokio::task::spawn_blocking(move || provider.force_flush()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "Span flush failed"),
            Err(e) => tracing::warn!(error = %e, "Span flush task failed"),
        }
    }

    /// Flush and stop the export pipeline. Spans ended afterwards are dropped.
    pub async fn shutdown(&self) {
        let provider = self.provider.clone();
        match tokio::task::spawn_blocking(move || provider.shutdown()).await {
            Ok(Ok(())) => tracing::info!(service = %self.service_name, "Tracer provider shut down"),
            Ok(Err(e)) => tracing::warn!(service = %self.service_name, error = %e, "Span export did not shut down cleanly"),
            Err(e) => tracing::warn!(service = %self.service_name, error = %e, "Span shutdown task failed"),
        }
    }
}

/// Mark the span in `cx` failed with `err`.
pub fn record_failure(cx: &Context, err: &(dyn StdError + 'static)) {
    let span = cx.span();
    span.record_error(err);
    span.set_status(Status::error(err.to_string()));
}

fn resource(config: &TracingConfig) -> Resource {
    Resource::builder()
        .with_service_name(config.service_name.clone())
        .with_attribute(KeyValue::new("service.version", config.service_version.clone()))
        .build()
}

/// New traces are sampled by ratio; resumed ones keep the caller's decision.
fn sampler(config: &TracingConfig) -> Sampler {
    Sampler::ParentBased(Box::new(Sampler::TraceIdRatioBased(config.sample_ratio)))
}

fn collector_endpoint(base: &str) -> String {
    let base = base.trim_end_matches('/');
    if base.ends_with(SPANS_PATH) {
        base.to_string()
    } else {
        format!("{base}{SPANS_PATH}")
    }
}
