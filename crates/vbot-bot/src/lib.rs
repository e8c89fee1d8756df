//! vbot application.
//!
//! Wires the fleet, executor and scheduler crates together:
//! - TOML configuration with environment secrets
//! - Wallet-set setup, funding and collection
//! - Optional purchase burst
//! - Steady-state volume run with graceful Ctrl-C stop

pub mod app;
pub mod config;
pub mod error;

pub use app::{Application, RunReport};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
