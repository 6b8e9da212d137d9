//! HTTP plumbing shared by both services.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (request id, access log, timeout, metrics)
//!     → request.rs (request id helpers)
//!     → [role handler: gateway or aggregator]
//!     → client.rs (outbound calls, UpstreamError)
//!     → response.rs (ServiceError → status + plain-text body)
//! ```

pub mod client;
pub mod request;
pub mod response;
pub mod server;

pub use client::{build_client, Deadline, UpstreamError};
pub use request::{request_id, UuidRequestId, X_REQUEST_ID};
pub use response::ServiceError;
pub use server::HttpServer;
