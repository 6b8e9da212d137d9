//! `POST /weather` on the gateway.

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use opentelemetry::trace::{SpanKind, Status, TraceContextExt};
use opentelemetry::{Context, KeyValue};

use crate::domain::parse_request;
use crate::gateway::forward::AggregatorReply;
use crate::gateway::GatewayState;
use crate::http::client::{Deadline, UpstreamError};
use crate::http::request::request_id;
use crate::http::response::{plain_text, ServiceError};
use crate::observability::trace::{propagation, record_failure};

pub async fn get_weather(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let deadline = Deadline::after(state.request_timeout);
    let parent = propagation::extract(&headers);
    let cx = state
        .telemetry
        .start("validate-zipcode", SpanKind::Server, &parent);
    let request_id = request_id(&headers);
    if let Some(id) = request_id {
        cx.span().set_attribute(KeyValue::new("request.id", id.to_string()));
    }

    let response = match handle(&state, body, request_id, &cx, deadline).await {
        Ok(response) => response,
        Err(err) => {
            record_failure(&cx, &err);
            err.into_response()
        }
    };

    let span = cx.span();
    span.set_attribute(KeyValue::new("http.status_code", i64::from(response.status().as_u16())));
    if response.status() == StatusCode::OK {
        span.set_status(Status::Ok);
    }
    span.end();
    response
}

async fn handle(
    state: &GatewayState,
    body: Result<Bytes, BytesRejection>,
    request_id: Option<&str>,
    parent: &Context,
    deadline: Deadline,
) -> Result<Response, ServiceError> {
    let body = body?;
    let zip = parse_request(&body)?;

    let cx = state
        .telemetry
        .start("request-service-b", SpanKind::Client, parent);
    cx.span().set_attribute(KeyValue::new("zipcode", zip.as_str().to_string()));
    cx.span()
        .set_attribute(KeyValue::new("http.url", state.aggregator.endpoint().to_string()));

    tracing::debug!(zipcode = %zip, "Forwarding to aggregator");

    // the raw body goes out unchanged; the aggregator validates it again
    let reply = match state
        .aggregator
        .forward(body, &cx, request_id, deadline.remaining())
        .await
    {
        Ok(reply) => reply,
        Err(err) => {
            record_failure(&cx, &err);
            if err.is_timeout() {
                cx.span().set_attribute(KeyValue::new("error.type", "timeout"));
            }
            return Err(ServiceError::Downstream(err));
        }
    };

    match reply {
        AggregatorReply::Weather(weather) => {
            cx.span().set_status(Status::Ok);
            Ok(Json(weather).into_response())
        }
        AggregatorReply::Failure { status, body } => {
            cx.span()
                .set_attribute(KeyValue::new("http.status_code", i64::from(status.as_u16())));
            let err = UpstreamError::Status {
                service: "aggregator",
                status,
            };
            record_failure(&cx, &err);

            if state.relay_upstream_status {
                tracing::info!(status = status.as_u16(), "Relaying aggregator failure");
                Ok(plain_text(status, body))
            } else {
                Err(ServiceError::Downstream(err))
            }
        }
    }
}
