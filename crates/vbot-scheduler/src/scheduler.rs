//! Volume scheduler control loop.
//!
//! One logical thread of control: units run strictly one after another and
//! every wait is a cooperative `tokio::time::sleep`. The only state shared with
//! the outside is the [`StopHandle`] flag and the snapshot channel.

use crate::error::{SchedulerError, SchedulerResult};
use crate::front_load::sample_trade_size;
use crate::pause::PauseSchedule;
use crate::state::{CompletionCause, RunSnapshot, RunState, SchedulerState, StopHandle};
use crate::summary::RunSummary;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use vbot_core::{CycleConfig, Lamports, RandomSource, TradeSide, Wallet};
use vbot_executor::DynTradeExecutor;
use vbot_telemetry::Metrics;

/// What a single unit did.
enum UnitOutcome {
    Paused,
    Traded,
    VolumeLimitReached,
}

/// Drives the buy/sell unit sequence over a funded wallet set.
pub struct VolumeScheduler {
    config: CycleConfig,
    wallets: Vec<Wallet>,
    executor: DynTradeExecutor,
    rng: Arc<dyn RandomSource>,
    total_units: usize,
    state: SchedulerState,
    stop: StopHandle,
    pauses: Option<PauseSchedule>,
    snapshot_tx: watch::Sender<RunSnapshot>,
}

impl VolumeScheduler {
    /// Validate the configuration against the wallet set.
    ///
    /// A validation failure starts nothing.
    pub fn new(
        config: CycleConfig,
        wallets: Vec<Wallet>,
        executor: DynTradeExecutor,
        rng: Arc<dyn RandomSource>,
    ) -> SchedulerResult<Self> {
        config.validate(wallets.len())?;
        let total_units = config.total_units(wallets.len());
        let (snapshot_tx, _) = watch::channel(RunSnapshot::idle(total_units));

        Ok(Self {
            config,
            wallets,
            executor,
            rng,
            total_units,
            state: SchedulerState::Idle,
            stop: StopHandle::new(),
            pauses: None,
            snapshot_tx,
        })
    }

    /// Use a fixed pause schedule instead of sampling one at entry.
    pub fn with_pause_schedule(mut self, pauses: PauseSchedule) -> Self {
        self.pauses = Some(pauses);
        self
    }

    /// Share an existing stop handle, e.g. one already wired to a signal.
    pub fn with_stop_handle(mut self, stop: StopHandle) -> Self {
        self.stop = stop;
        self
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn snapshots(&self) -> watch::Receiver<RunSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn total_units(&self) -> usize {
        self.total_units
    }

    /// The schedule in use. `None` before the run starts unless one was given.
    pub fn pause_schedule(&self) -> Option<&PauseSchedule> {
        self.pauses.as_ref()
    }

    /// Run every unit until completion, the volume cap, or a stop request.
    ///
    /// Per-unit trade failures are counted and logged, never returned. The
    /// only errors are the ones that prevent a run from starting.
    pub async fn run(&mut self) -> SchedulerResult<RunSummary> {
        if self.state != SchedulerState::Idle {
            return Err(SchedulerError::AlreadyRan);
        }

        let mut run = RunState::begin();
        let pauses = match self.pauses.take() {
            Some(p) => p,
            None => PauseSchedule::sample(
                self.config.pause_count,
                self.total_units,
                self.config.pause_duration_ms,
                self.rng.as_ref(),
            ),
        };
        self.set_state(SchedulerState::Running, &run);

        let pause_units: Vec<usize> = pauses.indices().collect();
        info!(
            wallets = self.wallets.len(),
            total_units = self.total_units,
            pauses = ?pause_units,
            max_volume = ?self.config.max_volume.map(|v| v.to_string()),
            "Volume scheduler started"
        );

        let final_state = self.run_units(&mut run, &pauses).await;
        self.pauses = Some(pauses);
        self.set_state(final_state, &run);

        let summary = RunSummary::from_state(final_state, &run, self.total_units);
        summary.log();
        Ok(summary)
    }

    async fn run_units(&self, run: &mut RunState, pauses: &PauseSchedule) -> SchedulerState {
        let wallet_count = self.wallets.len();
        let mut last_check_bucket = 0u64;

        for unit in 0..self.total_units {
            if self.stop.is_stop_requested() {
                info!(unit, "Stop requested, leaving scheduler loop");
                return SchedulerState::Stopped;
            }

            run.cycle_count = unit / wallet_count + 1;
            let outcome = if pauses.contains(unit) {
                self.pause(unit, pauses).await
            } else {
                self.trade_unit(unit, run, &mut last_check_bucket).await
            };

            run.units_executed += 1;
            Metrics::units_executed_set(run.units_executed);
            match outcome {
                UnitOutcome::Paused => run.paused_units += 1,
                UnitOutcome::Traded => {}
                UnitOutcome::VolumeLimitReached => {
                    info!(
                        unit,
                        volume = %run.cumulative_volume,
                        "Volume limit reached"
                    );
                    return SchedulerState::Completed(CompletionCause::VolumeLimitReached);
                }
            }
            self.publish(SchedulerState::Running, run);

            let cycle_done = (unit + 1) % wallet_count == 0;
            if cycle_done && unit + 1 < self.total_units && !self.stop.is_stop_requested() {
                let interval = self.rng.duration_ms(&self.config.interval_ms);
                debug!(
                    cycle = run.cycle_count,
                    interval_ms = interval.as_millis() as u64,
                    "Cycle finished"
                );
                tokio::time::sleep(interval).await;
            }
        }

        SchedulerState::Completed(CompletionCause::AllUnitsConsumed)
    }

    async fn pause(&self, unit: usize, pauses: &PauseSchedule) -> UnitOutcome {
        let duration = pauses.sample_duration(self.rng.as_ref());
        info!(unit, secs = duration.as_secs(), "Silent pause");
        Metrics::pause_injected(duration.as_millis() as u64);
        tokio::time::sleep(duration).await;
        UnitOutcome::Paused
    }

    async fn trade_unit(
        &self,
        unit: usize,
        run: &mut RunState,
        last_check_bucket: &mut u64,
    ) -> UnitOutcome {
        let wallet = &self.wallets[unit % self.wallets.len()];
        let rng = self.rng.as_ref();

        let size = sample_trade_size(
            &self.config.sol_amount_lamports,
            run.elapsed_minutes(),
            self.config.front_load_window_minutes,
            rng,
        );
        let price_bump = rng.sample_f64(&self.config.price_bump);
        debug!(unit, wallet = %wallet, %size, price_bump, "Unit start");

        let buy_ok = match self.executor.buy(wallet, size, price_bump).await {
            Ok(receipt) => {
                debug!(wallet = %wallet, signature = %receipt.signature, "Buy confirmed");
                true
            }
            Err(e) => {
                warn!(unit, wallet = %wallet, error = %e, "Buy failed");
                false
            }
        };
        Metrics::trade(TradeSide::Buy, buy_ok);

        tokio::time::sleep(rng.duration_ms(&self.config.bundle_delay_ms)).await;

        let sell_ok = match self.executor.sell(wallet, price_bump).await {
            Ok(receipt) => {
                debug!(wallet = %wallet, signature = %receipt.signature, "Sell confirmed");
                true
            }
            Err(e) => {
                warn!(unit, wallet = %wallet, error = %e, "Sell failed");
                false
            }
        };
        Metrics::trade(TradeSide::Sell, sell_ok);

        run.total_trades += 2;
        run.failed_trades += u64::from(!buy_ok) + u64::from(!sell_ok);
        run.cumulative_volume += size;
        Metrics::volume_added(size);

        if self.volume_check_due(run.total_trades, last_check_bucket)
            && self.volume_limit_reached(run.cumulative_volume)
        {
            return UnitOutcome::VolumeLimitReached;
        }
        UnitOutcome::Traded
    }

    /// True whenever `total_trades` crosses a multiple of the check interval.
    fn volume_check_due(&self, total_trades: u64, last_bucket: &mut u64) -> bool {
        let bucket = total_trades / self.config.volume_check_every_n_trades.max(1);
        if bucket > *last_bucket {
            *last_bucket = bucket;
            return true;
        }
        false
    }

    fn volume_limit_reached(&self, volume: Lamports) -> bool {
        self.config.max_volume.is_some_and(|max| volume >= max)
    }

    fn set_state(&mut self, state: SchedulerState, run: &RunState) {
        self.state = state;
        Metrics::scheduler_state_set(state.as_str());
        self.publish(state, run);
    }

    fn publish(&self, state: SchedulerState, run: &RunState) {
        self.snapshot_tx
            .send_replace(run.snapshot(state, self.total_units));
    }
}
