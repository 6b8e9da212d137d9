//! Error mapping shared by both services.
//!
//! Every failure a handler can produce is a [`ServiceError`]. The status and
//! the public body are fixed per variant; the cause chain only goes to the
//! log.

use std::error::Error as _;

use axum::extract::rejection::BytesRejection;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::domain::{BodyError, ZipCode};
use crate::http::client::UpstreamError;

pub const MSG_UNREADABLE: &str = "Failed to read/unmarshal request body";
pub const MSG_INVALID_ZIP: &str = "Invalid ZIP code";
pub const MSG_DOWNSTREAM: &str = "zipcode invalido";
pub const MSG_NOT_FOUND: &str = "ZIP code not found";
pub const MSG_INTERNAL: &str = "Internal Server Error";

pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("request body could not be read")]
    UnreadableBody(#[source] BytesRejection),

    #[error("request body could not be decoded")]
    MalformedBody(#[source] serde_json::Error),

    #[error(transparent)]
    InvalidZip(BodyError),

    /// The aggregator could not be reached or answered with garbage.
    #[error("aggregator call failed")]
    Downstream(#[source] UpstreamError),

    #[error("zip code {0} not found")]
    ZipNotFound(ZipCode),

    #[error(transparent)]
    Upstream(UpstreamError),
}

impl From<BodyError> for ServiceError {
    fn from(err: BodyError) -> Self {
        match err {
            BodyError::Malformed(source) => ServiceError::MalformedBody(source),
            other => ServiceError::InvalidZip(other),
        }
    }
}

impl From<BytesRejection> for ServiceError {
    fn from(rejection: BytesRejection) -> Self {
        ServiceError::UnreadableBody(rejection)
    }
}

impl ServiceError {
    /// Aggregator mapping of a body error: JSON that does not decode into
    /// `{"cep": string}` is a 400 like broken JSON. The `From` conversion
    /// used by the gateway keeps it at 422.
    pub fn strict_body(err: BodyError) -> Self {
        match err {
            BodyError::Malformed(source) | BodyError::Shape(source) => ServiceError::MalformedBody(source),
            other => ServiceError::InvalidZip(other),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::UnreadableBody(_) | ServiceError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            ServiceError::InvalidZip(_) | ServiceError::Downstream(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::ZipNotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The body sent to the caller. Never includes the cause.
    pub fn public_message(&self) -> &'static str {
        match self {
            ServiceError::UnreadableBody(_) | ServiceError::MalformedBody(_) => MSG_UNREADABLE,
            ServiceError::InvalidZip(_) => MSG_INVALID_ZIP,
            ServiceError::Downstream(_) => MSG_DOWNSTREAM,
            ServiceError::ZipNotFound(_) => MSG_NOT_FOUND,
            ServiceError::Upstream(_) => MSG_INTERNAL,
        }
    }

    /// `self` followed by every source, joined with ": ".
    pub fn cause_chain(&self) -> String {
        let mut chain = self.to_string();
        let mut source = self.source();
        while let Some(cause) = source {
            chain.push_str(": ");
            chain.push_str(&cause.to_string());
            source = cause.source();
        }
        chain
    }
}

/// A plain-text response with the given status.
pub fn plain_text(status: StatusCode, body: impl Into<String>) -> Response {
    (status, [(header::CONTENT_TYPE, TEXT_PLAIN)], body.into()).into_response()
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.public_message();
        let cause = self.cause_chain();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), reason = message, cause = %cause, "Request failed");
        } else {
            tracing::warn!(status = status.as_u16(), reason = message, cause = %cause, "Request rejected");
        }

        plain_text(status, message)
    }
}
