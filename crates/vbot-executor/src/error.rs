//! Executor error types.

use std::time::Duration;
use thiserror::Error;
use vbot_core::{CoreError, TradeSide, WalletId};

/// Failure of a single buy or sell. Terminal for that unit only.
#[derive(Debug, Clone, Error)]
pub enum TradeError {
    #[error("{side} for {wallet} rejected: {reason}")]
    Rejected {
        wallet: WalletId,
        side: TradeSide,
        reason: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Task failed: {0}")]
    Task(String),
}

pub type TradeResult<T> = Result<T, TradeError>;

/// Bundle relay failure, surfaced verbatim and never retried.
#[derive(Debug, Clone, Error)]
pub enum BundleRelayError {
    #[error("Bundle has no operations")]
    EmptyBundle,

    #[error("Relay timed out after {0:?}")]
    Timeout(Duration),

    #[error("Relay request failed: {0}")]
    Network(String),

    #[error("Relay rejected bundle ({code}): {message}")]
    Rejected { code: i64, message: String },

    #[error("Invalid relay response: {0}")]
    InvalidResponse(String),
}

impl BundleRelayError {
    /// Metric label value.
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::EmptyBundle => "empty",
            Self::Timeout(_) => "timeout",
            Self::Rejected { .. } => "rejected",
            Self::Network(_) | Self::InvalidResponse(_) => "error",
        }
    }
}

pub type RelayResult<T> = Result<T, BundleRelayError>;

/// Precondition failures for executor setup.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("Validation error: {0}")]
    Validation(#[from] CoreError),

    #[error("Bundle mode requires a relay")]
    MissingRelay,

    #[error("HTTP client error: {0}")]
    HttpClient(String),
}

pub type ExecutorResult<T> = Result<T, ExecutorError>;
