//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(#[from] vbot_core::CoreError),

    #[error("Fleet error: {0}")]
    Fleet(#[from] vbot_fleet::FleetError),

    #[error("Executor error: {0}")]
    Executor(#[from] vbot_executor::ExecutorError),

    #[error("Scheduler error: {0}")]
    Scheduler(#[from] vbot_scheduler::SchedulerError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] vbot_telemetry::TelemetryError),

    #[error("Funding failed: {0}")]
    Funding(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
