//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! role defaults
//!     → optional TOML file (loader.rs)
//!     → environment overrides (URL_SERVICE_B, URL_ZIPKIN, WEATHER_API_KEY, ...)
//!     → validation.rs (semantic checks for the chosen role)
//!     → ServiceConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup; there is no reload
//! - All fields have defaults to allow an empty or missing file
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_config_with, ConfigError};
pub use schema::{
    AggregatorConfig, GatewayConfig, ListenerConfig, LogFormat, ObservabilityConfig, ServiceConfig,
    ServiceRole, TimeoutConfig, TracingConfig,
};
pub use validation::{validate_config, ValidationError};
