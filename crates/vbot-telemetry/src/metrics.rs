//! Prometheus metrics for vbot.
//!
//! Covers:
//! - Trades by side and outcome, traded volume and trade sizes
//! - Silent pauses
//! - Fleet funding and collection transfers
//! - Bundle submissions and burst purchases
//! - Scheduler state
//!
//! # Panics
//!
//! Metric registration uses `unwrap()`. A failure here means a duplicate
//! metric name, which is a programming error that must surface at startup.
//! These panics only occur during static initialization, never at runtime.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_gauge, register_gauge_vec, register_histogram,
    register_int_counter, CounterVec, Gauge, GaugeVec, Histogram, IntCounter,
};
use vbot_core::{Lamports, TradeSide, LAMPORTS_PER_SOL};

/// Trades attempted.
/// Labels: side (buy/sell), outcome (ok/failed)
pub static TRADES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "vbot_trades_total",
        "Total trades attempted by the scheduler",
        &["side", "outcome"]
    )
    .unwrap()
});

/// Cumulative traded volume in lamports.
pub static VOLUME_LAMPORTS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "vbot_volume_lamports_total",
        "Cumulative buy volume in lamports"
    )
    .unwrap()
});

/// Sampled buy size in SOL.
pub static TRADE_SIZE_SOL: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "vbot_trade_size_sol",
        "Sampled buy size in SOL",
        vec![0.001, 0.0025, 0.005, 0.01, 0.015, 0.02, 0.025, 0.05, 0.1]
    )
    .unwrap()
});

/// Silent pauses injected.
pub static PAUSES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("vbot_pauses_total", "Total silent pauses injected").unwrap()
});

/// Silent pause length in seconds.
pub static PAUSE_DURATION_SECS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "vbot_pause_duration_secs",
        "Silent pause length in seconds",
        vec![30.0, 60.0, 90.0, 120.0, 150.0, 180.0, 240.0, 300.0]
    )
    .unwrap()
});

/// Fleet transfers.
/// Labels: kind (distribute/collect), outcome (ok/failed/skipped)
pub static FLEET_TRANSFERS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "vbot_fleet_transfers_total",
        "Total fleet funding and collection transfers",
        &["kind", "outcome"]
    )
    .unwrap()
});

/// Lamports moved by fleet transfers.
/// Labels: kind (distribute/collect)
pub static FLEET_TRANSFERRED_LAMPORTS: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "vbot_fleet_transferred_lamports_total",
        "Lamports moved by fleet transfers",
        &["kind"]
    )
    .unwrap()
});

/// Bundle submissions.
/// Labels: outcome (accepted/rejected/timeout/error/empty)
pub static BUNDLE_SUBMISSIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "vbot_bundle_submissions_total",
        "Total bundle relay submissions",
        &["outcome"]
    )
    .unwrap()
});

/// Burst purchase tasks.
/// Labels: mode (independent/bundle), outcome (ok/failed)
pub static BURST_PURCHASES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "vbot_burst_purchases_total",
        "Total purchase burst tasks",
        &["mode", "outcome"]
    )
    .unwrap()
});

/// Scheduler state (1 = active).
/// Labels: state (idle/running/completed/stopped)
pub static SCHEDULER_STATE: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "vbot_scheduler_state",
        "Scheduler state machine current state (1=active, 0=inactive)",
        &["state"]
    )
    .unwrap()
});

/// Units consumed in the current run.
pub static UNITS_EXECUTED: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!(
        "vbot_units_executed",
        "Units consumed in the current run (trades and pauses)"
    )
    .unwrap()
});

fn outcome(ok: bool) -> &'static str {
    if ok {
        "ok"
    } else {
        "failed"
    }
}

/// Metrics facade.
pub struct Metrics;

impl Metrics {
    // =========================================================================
    // Scheduler
    // =========================================================================

    /// Record one buy or sell attempt.
    pub fn trade(side: TradeSide, ok: bool) {
        TRADES_TOTAL
            .with_label_values(&[side.as_str(), outcome(ok)])
            .inc();
    }

    /// Record a sampled buy size added to the run volume.
    pub fn volume_added(size: Lamports) {
        VOLUME_LAMPORTS_TOTAL.inc_by(size.inner());
        TRADE_SIZE_SOL.observe(size.inner() as f64 / LAMPORTS_PER_SOL as f64);
    }

    /// Record a silent pause.
    pub fn pause_injected(duration_ms: u64) {
        PAUSES_TOTAL.inc();
        PAUSE_DURATION_SECS.observe(duration_ms as f64 / 1000.0);
    }

    /// Set scheduler state. Only the active state is set to 1.
    pub fn scheduler_state_set(state: &str) {
        for s in &["idle", "running", "completed", "stopped"] {
            SCHEDULER_STATE.with_label_values(&[s]).set(0.0);
        }
        SCHEDULER_STATE.with_label_values(&[state]).set(1.0);
    }

    /// Set units consumed so far.
    pub fn units_executed_set(units: usize) {
        UNITS_EXECUTED.set(units as f64);
    }

    // =========================================================================
    // Fleet
    // =========================================================================

    /// Record a funding or collection transfer.
    pub fn fleet_transfer(kind: &str, ok: bool, amount: Lamports) {
        FLEET_TRANSFERS_TOTAL
            .with_label_values(&[kind, outcome(ok)])
            .inc();
        if ok {
            FLEET_TRANSFERRED_LAMPORTS
                .with_label_values(&[kind])
                .inc_by(amount.inner() as f64);
        }
    }

    /// Record a wallet skipped during collection.
    pub fn fleet_transfer_skipped(kind: &str) {
        FLEET_TRANSFERS_TOTAL
            .with_label_values(&[kind, "skipped"])
            .inc();
    }

    // =========================================================================
    // Bundles
    // =========================================================================

    /// Record a bundle submission outcome.
    pub fn bundle_submitted(outcome: &str) {
        BUNDLE_SUBMISSIONS_TOTAL.with_label_values(&[outcome]).inc();
    }

    /// Record a burst purchase task outcome.
    pub fn burst_purchase(mode: &str, ok: bool) {
        BURST_PURCHASES_TOTAL
            .with_label_values(&[mode, outcome(ok)])
            .inc();
    }

    /// Current value of a trade counter.
    pub fn trade_count(side: TradeSide, ok: bool) -> u64 {
        TRADES_TOTAL
            .with_label_values(&[side.as_str(), outcome(ok)])
            .get() as u64
    }
}
