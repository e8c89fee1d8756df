//! Dry-run lifecycle tests: setup, distribute, burst, run, collect.

use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;
use std::sync::Arc;
use tempfile::TempDir;
use vbot_bot::{AppConfig, AppError, Application};
use vbot_core::{CycleConfig, FleetConfig, Lamports, UniformRange};
use vbot_executor::{BurstMode, DynBundleRelay, DynTradeExecutor, MockRelay, SimulatedExecutor};
use vbot_fleet::{JsonFileStore, SimulatedLedger, WalletFleet};
use vbot_scheduler::{CompletionCause, SchedulerState};

fn config(dir: &TempDir) -> AppConfig {
    AppConfig {
        dry_run: true,
        wallets_file: dir
            .path()
            .join("wallets.json")
            .to_string_lossy()
            .into_owned(),
        seed: Some(11),
        fleet: FleetConfig {
            wallet_count: 3,
            funding_lamports: UniformRange::new(20_000_000, 20_000_000),
            reserve: Lamports(5_000),
            transfer_delay_ms: UniformRange::new(0, 500),
        },
        cycle: CycleConfig {
            cycles_per_wallet: 2,
            interval_ms: UniformRange::new(1_000, 2_000),
            bundle_delay_ms: UniformRange::new(0, 1_000),
            pause_count: 1,
            pause_duration_ms: UniformRange::new(5_000, 10_000),
            max_volume: None,
            ..CycleConfig::default()
        },
        ..AppConfig::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_dry_run_end_to_end() {
    let dir = TempDir::new().unwrap();
    let app = Application::new(config(&dir)).unwrap();

    let report = app.run().await.unwrap();

    assert_eq!(report.distribution.succeeded, 3);
    assert_eq!(report.distribution.total_distributed, Lamports(60_000_000));
    assert!(report.burst.is_none());

    assert_eq!(
        report.summary.state,
        SchedulerState::Completed(CompletionCause::AllUnitsConsumed)
    );
    assert_eq!(report.summary.units_executed, 6);
    assert_eq!(report.summary.paused_units, 1);
    assert_eq!(report.summary.trades_attempted, 10);

    let collection = report.collection.unwrap();
    assert_eq!(collection.succeeded, 3);
    assert_eq!(collection.total_collected, Lamports(60_000_000 - 3 * 5_000));
}

#[tokio::test(start_paused = true)]
async fn test_wallet_set_reused_across_runs() {
    let dir = TempDir::new().unwrap();
    let cfg = config(&dir);

    Application::new(cfg.clone()).unwrap().run().await.unwrap();
    let first = WalletFleet::load(&JsonFileStore::new(&cfg.wallets_file)).unwrap();

    Application::new(cfg.clone()).unwrap().run().await.unwrap();
    let second = WalletFleet::load(&JsonFileStore::new(&cfg.wallets_file)).unwrap();

    let addresses = |f: &WalletFleet| f.wallets().iter().map(|w| w.address).collect::<Vec<_>>();
    assert_eq!(addresses(&first), addresses(&second));
}

#[tokio::test(start_paused = true)]
async fn test_bare_array_wallet_file_is_used() {
    let dir = TempDir::new().unwrap();
    let cfg = config(&dir);
    let keys: Vec<Keypair> = (0..3).map(|_| Keypair::new()).collect();
    let entries: Vec<String> = keys
        .iter()
        .enumerate()
        .map(|(i, k)| {
            format!(
                r#"{{"name": "bot-{i}", "secretKey": "{}"}}"#,
                bs58::encode(k.to_bytes()).into_string()
            )
        })
        .collect();
    std::fs::write(&cfg.wallets_file, format!("[{}]", entries.join(","))).unwrap();

    let report = Application::new(cfg.clone()).unwrap().run().await.unwrap();
    assert_eq!(report.distribution.succeeded, 3);

    let fleet = WalletFleet::load(&JsonFileStore::new(&cfg.wallets_file)).unwrap();
    let addresses: Vec<_> = fleet.wallets().iter().map(|w| w.address).collect();
    let expected: Vec<_> = keys.iter().map(|k| k.pubkey()).collect();
    assert_eq!(addresses, expected);
}

#[tokio::test(start_paused = true)]
async fn test_wallet_count_mismatch_rejected() {
    let dir = TempDir::new().unwrap();
    let cfg = config(&dir);
    Application::new(cfg.clone()).unwrap().run().await.unwrap();

    let mut bigger = cfg;
    bigger.fleet.wallet_count = 4;
    let result = Application::new(bigger).unwrap().run().await;
    assert!(matches!(result, Err(AppError::Config(_))));
}

#[tokio::test(start_paused = true)]
async fn test_bundle_burst_before_run() {
    let dir = TempDir::new().unwrap();
    let mut cfg = config(&dir);
    cfg.burst.enabled = true;
    cfg.burst.mode = BurstMode::Bundle;

    let relay = Arc::new(MockRelay::new());
    let app = Application::new(cfg)
        .unwrap()
        .with_relay(relay.clone() as DynBundleRelay);

    let report = app.run().await.unwrap();

    let burst = report.burst.unwrap();
    assert_eq!(burst.succeeded(), 3);
    assert!(matches!(burst.bundle, Some(Ok(_))));

    let submissions = relay.submissions();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].operations.len(), 3);
    assert_eq!(submissions[0].tip_amount, Lamports(1_000_000));
}

#[tokio::test(start_paused = true)]
async fn test_stop_before_run_still_collects() {
    let dir = TempDir::new().unwrap();
    let app = Application::new(config(&dir)).unwrap();
    app.stop_handle().stop();

    let report = app.run().await.unwrap();

    assert_eq!(report.summary.state, SchedulerState::Stopped);
    assert_eq!(report.summary.units_executed, 0);
    assert_eq!(report.collection.unwrap().succeeded, 3);
}

#[tokio::test(start_paused = true)]
async fn test_unfunded_source_aborts_before_trading() {
    let dir = TempDir::new().unwrap();
    let app = Application::new(config(&dir))
        .unwrap()
        .with_ledger(Arc::new(SimulatedLedger::new()));

    let result = app.run().await;
    assert!(matches!(result, Err(AppError::Funding(_))));
}

#[tokio::test(start_paused = true)]
async fn test_live_mode_without_executor_moves_nothing() {
    let dir = TempDir::new().unwrap();
    let funding = Keypair::new();
    let cfg = AppConfig {
        dry_run: false,
        funding_key: Some(bs58::encode(funding.to_bytes()).into_string()),
        ..config(&dir)
    };

    let ledger = Arc::new(SimulatedLedger::new());
    ledger.set_balance(funding.pubkey(), Lamports(1_000_000_000));
    let app = Application::new(cfg.clone())
        .unwrap()
        .with_ledger(ledger.clone());

    let result = app.run().await;
    assert!(matches!(result, Err(AppError::Config(_))));
    assert_eq!(ledger.transfer_attempts(), 0);
    assert_eq!(ledger.balance(&funding.pubkey()), Lamports(1_000_000_000));
    assert!(!std::path::Path::new(&cfg.wallets_file).exists());
}

#[tokio::test(start_paused = true)]
async fn test_live_mode_with_executor_runs() {
    let dir = TempDir::new().unwrap();
    let funding = Keypair::new();
    let cfg = AppConfig {
        dry_run: false,
        funding_key: Some(bs58::encode(funding.to_bytes()).into_string()),
        ..config(&dir)
    };

    let ledger = Arc::new(SimulatedLedger::new());
    ledger.set_balance(funding.pubkey(), Lamports(1_000_000_000));
    let executor = Arc::new(SimulatedExecutor::new());
    let app = Application::new(cfg)
        .unwrap()
        .with_ledger(ledger.clone())
        .with_executor(executor.clone() as DynTradeExecutor);

    let report = app.run().await.unwrap();
    assert_eq!(report.distribution.succeeded, 3);
    assert_eq!(report.summary.trades_attempted, 10);
    assert_eq!(executor.calls().len(), 10);
}

#[test]
fn test_live_mode_without_key_fails_fast() {
    let dir = TempDir::new().unwrap();
    let cfg = AppConfig {
        dry_run: false,
        ..config(&dir)
    };
    assert!(matches!(Application::new(cfg), Err(AppError::Config(_))));
}
