//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → Metrics → Telemetry → HTTP client → Role state → Bind → Serve
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain connections → Flush spans → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: listeners start last (traffic only when ready)
//! - Spans are flushed after the server drains, so in-flight requests are exported

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
