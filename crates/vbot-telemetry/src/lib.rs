//! Prometheus metrics and structured logging for vbot.
//!
//! - Prometheus metrics for trades, volume, pauses, fleet transfers and bundles
//! - Structured logging with tracing (JSON in production)

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;
