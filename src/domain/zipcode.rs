//! Postal code (CEP) parsing and validation.

use std::fmt;

use serde::Deserialize;
use thiserror::Error;

/// Inbound request body: `{"cep": "<code>"}`.
///
/// A missing `cep` decodes as the empty string and fails validation.
#[derive(Debug, Clone, Deserialize)]
pub struct PostalCodeRequest {
    #[serde(default)]
    pub cep: String,
}

/// A postal code that matched `^\d{5}-?\d{3}$`.
///
/// The caller's spelling (with or without the hyphen) is preserved since
/// the resolution provider receives the raw code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipCode(String);

#[derive(Debug, Error, PartialEq, Eq)]
#[error("zip code {0:?} does not match NNNNN-NNN or NNNNNNNN")]
pub struct ZipCodeError(pub String);

impl ZipCode {
    pub fn parse(raw: &str) -> Result<Self, ZipCodeError> {
        let bytes = raw.as_bytes();
        let digits = |s: &[u8]| s.iter().all(u8::is_ascii_digit);

        let valid = match bytes.len() {
            8 => digits(bytes),
            9 => digits(&bytes[..5]) && bytes[5] == b'-' && digits(&bytes[6..]),
            _ => false,
        };

        if valid {
            Ok(Self(raw.to_string()))
        } else {
            Err(ZipCodeError(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ZipCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Why a request body did not yield a valid zip code.
#[derive(Debug, Error)]
pub enum BodyError {
    /// Not JSON at all (syntax error or truncated input).
    #[error("request body is not valid JSON")]
    Malformed(#[source] serde_json::Error),

    /// Valid JSON, but not `{"cep": string}`.
    #[error("request body does not carry a string `cep` field")]
    Shape(#[source] serde_json::Error),

    #[error(transparent)]
    Format(#[from] ZipCodeError),
}

/// Decode and validate a raw request body.
pub fn parse_request(body: &[u8]) -> Result<ZipCode, BodyError> {
    let request: PostalCodeRequest = serde_json::from_slice(body).map_err(|e| {
        if e.is_data() {
            BodyError::Shape(e)
        } else {
            BodyError::Malformed(e)
        }
    })?;

    Ok(ZipCode::parse(&request.cep)?)
}
