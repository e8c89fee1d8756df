//! Error types for vbot-core.

use thiserror::Error;

/// Core error types.
///
/// Every variant is a pre-run validation failure: nothing has moved and
/// nothing has started when one of these is returned.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid range for {field}: min {min} > max {max}")]
    InvalidRange {
        field: &'static str,
        min: String,
        max: String,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Decimal error: {0}")]
    Decimal(#[from] rust_decimal::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
