//! Zip code → weather, as two traced HTTP services.

pub mod aggregator;
pub mod config;
pub mod domain;
pub mod gateway;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::{ServiceConfig, ServiceRole};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
