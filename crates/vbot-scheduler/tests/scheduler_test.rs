//! End-to-end scheduler runs against the simulated executor.
//!
//! Every test runs on a paused tokio clock so multi-minute runs finish
//! instantly and call timestamps are exact.

use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use vbot_core::{
    CycleConfig, CycleScope, Lamports, ScriptedRandom, StdRandom, TradeSide, UniformRange, Wallet,
    WalletId,
};
use vbot_executor::SimulatedExecutor;
use vbot_scheduler::{CompletionCause, PauseSchedule, SchedulerState, VolumeScheduler};

fn wallets(n: u32) -> Vec<Wallet> {
    (1..=n)
        .map(|i| Wallet::new(WalletId::new(i), Pubkey::new_unique()))
        .collect()
}

/// Fixed 10M lamport trades, 1 s bundle delay, no inter-cycle wait.
fn fixed_config(cycles_per_wallet: usize) -> CycleConfig {
    CycleConfig {
        cycles_per_wallet,
        scope: CycleScope::Wallet,
        interval_ms: UniformRange::new(0, 0),
        sol_amount_lamports: UniformRange::new(10_000_000, 10_000_000),
        bundle_delay_ms: UniformRange::new(1_000, 1_000),
        pause_duration_ms: UniformRange::new(100_000, 100_000),
        max_volume: None,
        ..CycleConfig::default()
    }
}

fn executor() -> Arc<SimulatedExecutor> {
    Arc::new(SimulatedExecutor::with_latency(Duration::ZERO))
}

// ============================================================================
// Full runs
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_six_wallets_eleven_cycles_unbounded() {
    let config = CycleConfig {
        max_volume: None,
        ..CycleConfig::default()
    };
    let exec = executor();
    let mut scheduler = VolumeScheduler::new(
        config,
        wallets(6),
        exec.clone(),
        Arc::new(StdRandom::seeded(42)),
    )
    .unwrap();
    assert_eq!(scheduler.total_units(), 66);

    let summary = scheduler.run().await.unwrap();

    assert_eq!(
        summary.state,
        SchedulerState::Completed(CompletionCause::AllUnitsConsumed)
    );
    assert_eq!(summary.units_executed, 66);
    assert_eq!(summary.cycle_count, 11);
    assert_eq!(summary.paused_units, 2);
    assert_eq!(summary.trades_attempted, 132 - 2 * summary.paused_units as u64);
    assert_eq!(summary.trades_failed, 0);
    assert_eq!(exec.call_count(TradeSide::Buy), 64);
    assert_eq!(exec.call_count(TradeSide::Sell), 64);

    let sizes: Lamports = exec.calls().iter().filter_map(|c| c.size).sum();
    assert_eq!(summary.volume, sizes);
}

#[tokio::test(start_paused = true)]
async fn test_volume_limit_mid_run() {
    // 10M per unit against a 200M cap, checked every 5 trades.
    let config = CycleConfig {
        max_volume: Some(Lamports(200_000_000)),
        volume_check_every_n_trades: 5,
        pause_count: 0,
        ..fixed_config(11)
    };
    let exec = executor();
    let mut scheduler = VolumeScheduler::new(
        config,
        wallets(6),
        exec.clone(),
        Arc::new(ScriptedRandom::constant(0.5)),
    )
    .unwrap();

    let summary = scheduler.run().await.unwrap();

    assert_eq!(
        summary.state,
        SchedulerState::Completed(CompletionCause::VolumeLimitReached)
    );
    // 20 units reach 200M; 40 trades is a multiple of 5.
    assert_eq!(summary.units_executed, 20);
    assert_eq!(summary.trades_attempted, 40);
    assert_eq!(summary.volume, Lamports(200_000_000));
    assert!(summary.units_executed < summary.total_units);
}

#[tokio::test(start_paused = true)]
async fn test_trade_failures_are_isolated() {
    let exec = executor();
    exec.fail_always(WalletId::new(2), TradeSide::Buy);
    exec.fail_once(WalletId::new(3), TradeSide::Sell);

    let config = CycleConfig {
        pause_count: 0,
        ..fixed_config(2)
    };
    let mut scheduler = VolumeScheduler::new(
        config,
        wallets(3),
        exec.clone(),
        Arc::new(ScriptedRandom::constant(0.5)),
    )
    .unwrap();

    let summary = scheduler.run().await.unwrap();

    assert_eq!(
        summary.state,
        SchedulerState::Completed(CompletionCause::AllUnitsConsumed)
    );
    assert_eq!(summary.units_executed, 6);
    assert_eq!(summary.trades_attempted, 12);
    assert_eq!(summary.trades_failed, 3);
    // A failed buy still attempts the sell.
    assert_eq!(exec.call_count(TradeSide::Sell), 6);
}

#[tokio::test(start_paused = true)]
async fn test_cycle_scope_round_robin() {
    // 5 units over 2 wallets: cycles {1,2}, {1,2}, {1}.
    let config = CycleConfig {
        scope: CycleScope::Cycle,
        total_cycles: Some(5),
        interval_ms: UniformRange::new(30_000, 30_000),
        pause_count: 0,
        ..fixed_config(11)
    };
    let exec = executor();
    let mut scheduler = VolumeScheduler::new(
        config,
        wallets(2),
        exec.clone(),
        Arc::new(ScriptedRandom::constant(0.5)),
    )
    .unwrap();
    assert_eq!(scheduler.total_units(), 5);

    let start = Instant::now();
    let summary = scheduler.run().await.unwrap();

    assert_eq!(
        summary.state,
        SchedulerState::Completed(CompletionCause::AllUnitsConsumed)
    );
    assert_eq!(summary.units_executed, 5);
    assert_eq!(summary.cycle_count, 3);
    assert_eq!(summary.trades_attempted, 10);

    let buys: Vec<_> = exec
        .calls()
        .into_iter()
        .filter(|c| c.side == TradeSide::Buy)
        .collect();
    let order: Vec<u32> = buys.iter().map(|c| c.wallet.index()).collect();
    assert_eq!(order, vec![1, 2, 1, 2, 1]);

    // Interval sleeps follow units 1 and 3 only, never the final unit.
    let offsets: Vec<Duration> = buys.iter().map(|c| c.at - start).collect();
    let secs = |s: u64| Duration::from_secs(s);
    assert_eq!(offsets, vec![secs(0), secs(1), secs(32), secs(33), secs(64)]);
    assert_eq!(start.elapsed(), secs(65));
}

// ============================================================================
// Pauses
// ============================================================================

/// Start time of unit `u` when every trade unit takes 1 s and every pause 100 s.
fn expected_start(unit: usize, pauses: &PauseSchedule) -> Duration {
    let paused = (0..unit).filter(|u| pauses.contains(*u)).count() as u64;
    let traded = unit as u64 - paused;
    Duration::from_millis(traded * 1_000 + paused * 100_000)
}

#[tokio::test(start_paused = true)]
async fn test_pauses_at_scheduled_indices_only() {
    for (seed, wallet_count, cycles) in [(1u64, 2u32, 3usize), (7, 3, 4), (99, 6, 11), (5, 1, 2)] {
        let exec = executor();
        let mut scheduler = VolumeScheduler::new(
            fixed_config(cycles),
            wallets(wallet_count),
            exec.clone(),
            Arc::new(StdRandom::seeded(seed)),
        )
        .unwrap();
        let total = scheduler.total_units();

        let start = Instant::now();
        let summary = scheduler.run().await.unwrap();
        let pauses = scheduler.pause_schedule().unwrap().clone();

        assert_eq!(pauses.len(), 2.min(total));
        assert_eq!(summary.paused_units, pauses.len());

        let buys: Vec<_> = exec
            .calls()
            .into_iter()
            .filter(|c| c.side == TradeSide::Buy)
            .collect();
        let traded_units: Vec<usize> = (0..total).filter(|u| !pauses.contains(*u)).collect();
        assert_eq!(buys.len(), traded_units.len());

        for (call, unit) in buys.iter().zip(&traded_units) {
            let wallet = (*unit % wallet_count as usize) as u32 + 1;
            assert_eq!(call.wallet, WalletId::new(wallet), "seed={seed} unit={unit}");
            assert_eq!(
                call.at - start,
                expected_start(*unit, &pauses),
                "seed={seed} unit={unit}"
            );
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_explicit_pause_schedule() {
    let exec = executor();
    let pauses = PauseSchedule::from_indices([0, 3], UniformRange::new(100_000, 100_000));
    let mut scheduler = VolumeScheduler::new(
        fixed_config(2),
        wallets(2),
        exec.clone(),
        Arc::new(ScriptedRandom::constant(0.5)),
    )
    .unwrap()
    .with_pause_schedule(pauses);

    let start = Instant::now();
    let summary = scheduler.run().await.unwrap();

    assert_eq!(summary.paused_units, 2);
    assert_eq!(summary.trades_attempted, 4);
    let buys: Vec<u32> = exec
        .calls()
        .iter()
        .filter(|c| c.side == TradeSide::Buy)
        .map(|c| c.wallet.index())
        .collect();
    assert_eq!(buys, vec![2, 1]);
    assert_eq!(start.elapsed(), Duration::from_millis(202_000));
}

// ============================================================================
// Stop and front-loading
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_stop_mid_run_finishes_current_unit() {
    let exec = Arc::new(SimulatedExecutor::new());
    let config = CycleConfig {
        pause_count: 0,
        ..fixed_config(11)
    };
    let mut scheduler = VolumeScheduler::new(
        config,
        wallets(6),
        exec.clone(),
        Arc::new(ScriptedRandom::constant(0.5)),
    )
    .unwrap();
    let stop = scheduler.stop_handle();
    let mut rx = scheduler.snapshots();

    let task = tokio::spawn(async move { scheduler.run().await });

    rx.wait_for(|s| s.units_executed >= 5).await.unwrap();
    stop.stop();

    let summary = task.await.unwrap().unwrap();
    assert_eq!(summary.state, SchedulerState::Stopped);
    assert!(summary.units_executed >= 5 && summary.units_executed < 66);
    // The in-flight unit completed both legs.
    assert_eq!(exec.call_count(TradeSide::Buy), exec.call_count(TradeSide::Sell));
    assert_eq!(
        summary.trades_attempted,
        2 * summary.units_executed as u64
    );
    assert_eq!(rx.borrow().state, SchedulerState::Stopped);
}

#[tokio::test(start_paused = true)]
async fn test_front_loaded_sizes_follow_run_clock() {
    // One wallet, one unit per minute, always drawing the upper bound.
    let config = CycleConfig {
        cycles_per_wallet: 8,
        interval_ms: UniformRange::new(60_000, 60_000),
        sol_amount_lamports: UniformRange::new(5_000_000, 25_000_000),
        bundle_delay_ms: UniformRange::new(0, 0),
        front_load_window_minutes: 5.0,
        pause_count: 0,
        max_volume: None,
        ..CycleConfig::default()
    };
    let exec = executor();
    let mut scheduler = VolumeScheduler::new(
        config,
        wallets(1),
        exec.clone(),
        Arc::new(ScriptedRandom::constant(1.0)),
    )
    .unwrap();
    scheduler.run().await.unwrap();

    let sizes: Vec<u64> = exec
        .calls()
        .iter()
        .filter_map(|c| c.size.map(|s| s.inner()))
        .collect();
    assert_eq!(sizes.len(), 8);
    assert_eq!(sizes[0], 25_000_000);
    assert_eq!(sizes[4], 20_200_000);
    assert!(sizes[..5].windows(2).all(|w| w[0] >= w[1]), "{sizes:?}");
    assert!(sizes[5..].iter().all(|s| *s == 25_000_000), "{sizes:?}");
}
