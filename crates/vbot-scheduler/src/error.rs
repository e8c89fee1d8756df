//! Scheduler error types.

use thiserror::Error;
use vbot_core::CoreError;

/// Scheduler errors. All are raised before the first unit runs.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Validation error: {0}")]
    Validation(#[from] CoreError),

    #[error("Scheduler already ran; create a new one per run")]
    AlreadyRan,
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;
