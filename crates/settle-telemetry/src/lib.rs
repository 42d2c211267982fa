//! Prometheus metrics and structured logging for settle.
//!
//! - `init_logging`: tracing subscriber, JSON in production, pretty otherwise
//! - `Metrics`: counters for built orders, escrow and channel transitions,
//!   scanner results and rejected operations

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{init_logging, LogFormat, TelemetryConfig};
pub use metrics::Metrics;
