//! Run lifecycle state, counters, and the external stop flag.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time::Instant;
use vbot_core::Lamports;

/// Why a run ended without an external stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionCause {
    /// Every configured unit was consumed.
    AllUnitsConsumed,
    /// Cumulative volume reached the configured cap at a check point.
    VolumeLimitReached,
}

impl fmt::Display for CompletionCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllUnitsConsumed => write!(f, "all_units_consumed"),
            Self::VolumeLimitReached => write!(f, "volume_limit_reached"),
        }
    }
}

/// Scheduler lifecycle.
///
/// `Idle -> Running -> {Completed, Stopped}`. Both end states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "cause")]
pub enum SchedulerState {
    Idle,
    Running,
    Completed(CompletionCause),
    Stopped,
}

impl SchedulerState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed(_) | Self::Stopped)
    }

    /// Metric label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed(_) => "completed",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed(cause) => write!(f, "completed({cause})"),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

// ============================================================================
// StopHandle
// ============================================================================

/// External stop request.
///
/// Cloneable and lock-free. The scheduler checks it at the top of every unit,
/// so a stop lands after the in-flight unit finishes and never interrupts a
/// submitted trade.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    requested: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a graceful stop. Idempotent.
    pub fn stop(&self) {
        self.requested.store(true, Ordering::Release);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }
}

// ============================================================================
// RunState
// ============================================================================

/// Mutable counters owned by the scheduler's control loop.
#[derive(Debug, Clone)]
pub(crate) struct RunState {
    pub cycle_count: usize,
    pub units_executed: usize,
    pub paused_units: usize,
    pub total_trades: u64,
    pub failed_trades: u64,
    pub cumulative_volume: Lamports,
    pub started_at: DateTime<Utc>,
    pub start: Instant,
}

impl RunState {
    pub fn begin() -> Self {
        Self {
            cycle_count: 0,
            units_executed: 0,
            paused_units: 0,
            total_trades: 0,
            failed_trades: 0,
            cumulative_volume: Lamports::ZERO,
            started_at: Utc::now(),
            start: Instant::now(),
        }
    }

    /// Minutes since the run started, on the tokio clock.
    pub fn elapsed_minutes(&self) -> f64 {
        self.start.elapsed().as_secs_f64() / 60.0
    }

    pub fn snapshot(&self, state: SchedulerState, total_units: usize) -> RunSnapshot {
        RunSnapshot {
            state,
            total_units,
            cycle_count: self.cycle_count,
            units_executed: self.units_executed,
            paused_units: self.paused_units,
            total_trades: self.total_trades,
            failed_trades: self.failed_trades,
            cumulative_volume: self.cumulative_volume,
        }
    }
}

/// Read-only progress view published after every unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSnapshot {
    pub state: SchedulerState,
    pub total_units: usize,
    pub cycle_count: usize,
    pub units_executed: usize,
    pub paused_units: usize,
    pub total_trades: u64,
    pub failed_trades: u64,
    pub cumulative_volume: Lamports,
}

impl RunSnapshot {
    pub(crate) fn idle(total_units: usize) -> Self {
        Self {
            state: SchedulerState::Idle,
            total_units,
            cycle_count: 0,
            units_executed: 0,
            paused_units: 0,
            total_trades: 0,
            failed_trades: 0,
            cumulative_volume: Lamports::ZERO,
        }
    }
}
