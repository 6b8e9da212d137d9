//! Domain types shared by both services.
//!
//! # Data Flow
//! ```text
//! request body
//!     → zipcode.rs (PostalCodeRequest → validated ZipCode)
//!     → [aggregator] resolution provider → AddressResolution
//!     → [aggregator] weather provider   → WeatherReading
//!     → weather.rs (WeatherReading → WeatherResponse)
//! ```
//!
//! # Design Decisions
//! - Validation produces a typed `ZipCode`; raw strings never reach a provider
//! - Nothing here performs I/O
//! - Conversions are pure f64 arithmetic, no rounding

pub mod weather;
pub mod zipcode;

pub use weather::{AddressResolution, WeatherReading, WeatherResponse};
pub use zipcode::{parse_request, BodyError, PostalCodeRequest, ZipCode, ZipCodeError};
