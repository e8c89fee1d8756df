//! Terminal run report.

use crate::state::{RunState, SchedulerState};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use tracing::info;
use vbot_core::Lamports;

/// Produced once per run, whatever the individual trades did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub state: SchedulerState,
    pub cycle_count: usize,
    pub total_units: usize,
    pub units_executed: usize,
    pub paused_units: usize,
    pub trades_attempted: u64,
    pub trades_failed: u64,
    pub volume: Lamports,
    pub elapsed: Duration,
    pub started_at: DateTime<Utc>,
}

impl RunSummary {
    pub(crate) fn from_state(state: SchedulerState, run: &RunState, total_units: usize) -> Self {
        Self {
            state,
            cycle_count: run.cycle_count,
            total_units,
            units_executed: run.units_executed,
            paused_units: run.paused_units,
            trades_attempted: run.total_trades,
            trades_failed: run.failed_trades,
            volume: run.cumulative_volume,
            elapsed: run.start.elapsed(),
            started_at: run.started_at,
        }
    }

    /// Average attempted trades per minute. Zero for a zero-length run.
    pub fn trades_per_minute(&self) -> f64 {
        let minutes = self.elapsed.as_secs_f64() / 60.0;
        if minutes <= 0.0 {
            return 0.0;
        }
        self.trades_attempted as f64 / minutes
    }

    pub fn trades_succeeded(&self) -> u64 {
        self.trades_attempted.saturating_sub(self.trades_failed)
    }

    pub fn log(&self) {
        info!("==== Run Summary ====");
        info!(state = %self.state, started_at = %self.started_at, "Outcome");
        info!(
            cycles = self.cycle_count,
            units = self.units_executed,
            total_units = self.total_units,
            paused = self.paused_units,
            "Units"
        );
        info!(
            attempted = self.trades_attempted,
            failed = self.trades_failed,
            per_minute = %format!("{:.2}", self.trades_per_minute()),
            "Trades"
        );
        info!(volume = %self.volume, elapsed_secs = self.elapsed.as_secs(), "Volume");
    }
}
