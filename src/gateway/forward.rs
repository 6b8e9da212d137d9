//! The gateway → aggregator hop.

use std::time::Duration;

use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use opentelemetry::Context;

use crate::domain::WeatherResponse;
use crate::http::client::{decode_json, UpstreamError};
use crate::http::request::X_REQUEST_ID;
use crate::observability::trace::propagation;

const SERVICE: &str = "aggregator";

/// What the aggregator answered.
#[derive(Debug, Clone, PartialEq)]
pub enum AggregatorReply {
    Weather(WeatherResponse),
    /// Any non-200 answer, body kept verbatim.
    Failure { status: StatusCode, body: String },
}

#[derive(Debug, Clone)]
pub struct AggregatorClient {
    client: reqwest::Client,
    endpoint: String,
}

impl AggregatorClient {
    /// `base_url` is the aggregator root; requests go to `{base_url}/weather`.
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            endpoint: format!("{}/weather", base_url.trim_end_matches('/')),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST `body` unchanged, carrying the span and baggage of `cx` and the
    /// request id. `timeout` covers the whole exchange, body included.
    pub async fn forward(
        &self,
        body: Bytes,
        cx: &Context,
        request_id: Option<&str>,
        timeout: Duration,
    ) -> Result<AggregatorReply, UpstreamError> {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        propagation::inject(cx, &mut headers);
        if let Some(value) = request_id.and_then(|id| HeaderValue::from_str(id).ok()) {
            headers.insert(X_REQUEST_ID, value);
        }

        let response = self
            .client
            .post(&self.endpoint)
            .headers(headers)
            .body(body)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| UpstreamError::transport(SERVICE, e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| UpstreamError::transport(SERVICE, e))?;

        if status == StatusCode::OK {
            Ok(AggregatorReply::Weather(decode_json(SERVICE, &text)?))
        } else {
            Ok(AggregatorReply::Failure { status, body: text })
        }
    }
}
