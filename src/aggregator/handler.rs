//! `POST /weather` on the aggregator.

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use opentelemetry::trace::{SpanKind, Status, TraceContextExt};
use opentelemetry::{Context, KeyValue};

use crate::aggregator::AggregatorState;
use crate::domain::{parse_request, WeatherResponse};
use crate::http::client::{Deadline, UpstreamError};
use crate::http::request::request_id;
use crate::http::response::ServiceError;
use crate::observability::trace::{propagation, record_failure};

pub async fn get_weather(
    State(state): State<AggregatorState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let deadline = Deadline::after(state.request_timeout);
    let parent = propagation::extract(&headers);
    let cx = state
        .telemetry
        .start("validate-zipcode", SpanKind::Server, &parent);
    if let Some(id) = request_id(&headers) {
        cx.span().set_attribute(KeyValue::new("request.id", id.to_string()));
    }

    let response = match handle(&state, body, &cx, deadline).await {
        Ok(weather) => {
            cx.span().set_status(Status::Ok);
            Json(weather).into_response()
        }
        Err(err) => {
            record_failure(&cx, &err);
            err.into_response()
        }
    };

    let span = cx.span();
    span.set_attribute(KeyValue::new("http.status_code", i64::from(response.status().as_u16())));
    span.end();
    response
}

async fn handle(
    state: &AggregatorState,
    body: Result<Bytes, BytesRejection>,
    parent: &Context,
    deadline: Deadline,
) -> Result<WeatherResponse, ServiceError> {
    let body = body?;
    let zip = parse_request(&body).map_err(ServiceError::strict_body)?;

    let address = {
        let cx = state
            .telemetry
            .start("request-via-cep", SpanKind::Client, parent);
        cx.span().set_attribute(KeyValue::new("zipcode", zip.as_str().to_string()));
        cx.span().set_attribute(KeyValue::new("http.url", state.viacep.lookup_url(&zip)));

        let result = state.viacep.lookup(&zip, deadline.cap(state.upstream_timeout)).await;
        finish_call(&cx, result)?
    };

    if !address.is_found() {
        return Err(ServiceError::ZipNotFound(zip));
    }

    tracing::debug!(zipcode = %zip, locality = %address.locality, "Resolved zip code");

    let reading = {
        let cx = state
            .telemetry
            .start("request-weather-api", SpanKind::Client, parent);
        cx.span().set_attribute(KeyValue::new("locality", address.locality.clone()));

        let result = state
            .weather
            .current(&address.locality, deadline.cap(state.upstream_timeout))
            .await;
        finish_call(&cx, result)?
    };

    Ok(WeatherResponse::from_reading(reading))
}

/// Close out the client span in `cx` with the provider call's outcome.
fn finish_call<T>(cx: &Context, result: Result<T, UpstreamError>) -> Result<T, ServiceError> {
    match result {
        Ok(value) => {
            cx.span().set_status(Status::Ok);
            Ok(value)
        }
        Err(err) => {
            record_failure(cx, &err);
            if err.is_timeout() {
                cx.span().set_attribute(KeyValue::new("error.type", "timeout"));
            }
            Err(ServiceError::Upstream(err))
        }
    }
}
