//! Outbound HTTP.
//!
//! One `reqwest::Client` is built at startup and cloned into each role's
//! state. It only bounds connection setup; every call carries its own
//! timeout, derived from the inbound request's [`Deadline`].

use std::time::Duration;

use axum::http::StatusCode;
use thiserror::Error;
use tokio::time::Instant;

use crate::config::TimeoutConfig;

/// Failure of a call to another service or external provider.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("{service} request failed")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} answered {status}")]
    Status {
        service: &'static str,
        status: StatusCode,
    },

    #[error("{service} response could not be decoded")]
    Decode {
        service: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl UpstreamError {
    pub fn transport(service: &'static str, source: reqwest::Error) -> Self {
        Self::Transport { service, source }
    }

    pub fn decode(service: &'static str, source: serde_json::Error) -> Self {
        Self::Decode { service, source }
    }

    pub fn service(&self) -> &'static str {
        match self {
            Self::Transport { service, .. } | Self::Status { service, .. } | Self::Decode { service, .. } => {
                service
            }
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport { source, .. } if source.is_timeout())
    }
}

/// The point in time by which an inbound request must be answered.
///
/// Captured when the handler starts; outbound calls made on the request's
/// behalf never outlive it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline(Instant);

impl Deadline {
    pub fn after(budget: Duration) -> Self {
        Self(Instant::now() + budget)
    }

    /// Time left, zero once passed.
    pub fn remaining(&self) -> Duration {
        self.0.saturating_duration_since(Instant::now())
    }

    /// Timeout for one outbound call limited to `per_call`.
    pub fn cap(&self, per_call: Duration) -> Duration {
        per_call.min(self.remaining())
    }
}

pub fn build_client(timeouts: &TimeoutConfig) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(timeouts.connect_secs))
        .user_agent(concat!("cep-weather/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Decode a JSON body already read as text, tagging failures with `service`.
pub fn decode_json<T>(service: &'static str, body: &str) -> Result<T, UpstreamError>
where
    T: serde::de::DeserializeOwned,
{
    serde_json::from_str(body).map_err(|e| UpstreamError::decode(service, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, serde::Deserialize)]
    struct Reading {
        #[allow(dead_code)]
        value: u32,
    }

    #[test]
    fn decode_failures_carry_the_service() {
        let err = decode_json::<Reading>("viacep", "<html>").unwrap_err();
        assert_eq!(err.service(), "viacep");
        assert!(matches!(err, UpstreamError::Decode { .. }));
        assert_eq!(err.to_string(), "viacep response could not be decoded");
    }

    #[test]
    fn status_error_message() {
        let err = UpstreamError::Status {
            service: "weatherapi",
            status: StatusCode::FORBIDDEN,
        };
        assert_eq!(err.to_string(), "weatherapi answered 403 Forbidden");
        assert!(!err.is_timeout());
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_caps_each_call() {
        let deadline = Deadline::after(Duration::from_secs(30));
        assert_eq!(deadline.cap(Duration::from_secs(10)), Duration::from_secs(10));

        tokio::time::advance(Duration::from_secs(25)).await;
        assert_eq!(deadline.remaining(), Duration::from_secs(5));
        assert_eq!(deadline.cap(Duration::from_secs(10)), Duration::from_secs(5));

        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(deadline.remaining(), Duration::ZERO);
    }

    #[test]
    fn client_builds_from_defaults() {
        assert!(build_client(&TimeoutConfig::default()).is_ok());
    }
}
