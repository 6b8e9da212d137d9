//! Current-conditions weather provider.

use std::time::Duration;

use serde::Deserialize;

use crate::domain::WeatherReading;
use crate::http::client::{decode_json, UpstreamError};

const SERVICE: &str = "weatherapi";

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    location: Location,
    current: Current,
}

#[derive(Debug, Deserialize)]
struct Location {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Current {
    temp_c: f64,
}

impl From<CurrentResponse> for WeatherReading {
    fn from(response: CurrentResponse) -> Self {
        WeatherReading {
            location_name: response.location.name,
            temperature_celsius: response.current.temp_c,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WeatherApiClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl WeatherApiClient {
    pub fn new(client: reqwest::Client, base_url: &str, api_key: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: format!("{}/current.json", base_url.trim_end_matches('/')),
            api_key: api_key.into(),
        }
    }

    /// Current temperature for `locality`. The query string is encoded by
    /// reqwest, so names like "São Paulo" go out percent-encoded.
    pub async fn current(&self, locality: &str, timeout: Duration) -> Result<WeatherReading, UpstreamError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("key", self.api_key.as_str()), ("q", locality)])
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| UpstreamError::transport(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                service: SERVICE,
                status,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| UpstreamError::transport(SERVICE, e))?;
        let decoded: CurrentResponse = decode_json(SERVICE, &body)?;
        Ok(decoded.into())
    }
}
