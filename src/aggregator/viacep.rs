//! Postal-code resolution provider.

use std::time::Duration;

use crate::domain::{AddressResolution, ZipCode};
use crate::http::client::{decode_json, UpstreamError};

const SERVICE: &str = "viacep";

#[derive(Debug, Clone)]
pub struct ViaCepClient {
    client: reqwest::Client,
    base_url: String,
}

impl ViaCepClient {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// `{base}/ws/{code}/json/`, with the code exactly as the caller sent it.
    pub fn lookup_url(&self, zip: &ZipCode) -> String {
        format!("{}/ws/{}/json/", self.base_url, zip)
    }

    /// Resolve `zip` within `timeout`. An unknown code is not an error here:
    /// the provider answers 200 with an empty record, see
    /// [`AddressResolution::is_found`].
    pub async fn lookup(&self, zip: &ZipCode, timeout: Duration) -> Result<AddressResolution, UpstreamError> {
        let response = self
            .client
            .get(self.lookup_url(zip))
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
        decode_json(SERVICE, &body)
    }
}
