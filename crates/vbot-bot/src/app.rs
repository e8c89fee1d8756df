//! Main application orchestration.
//!
//! One run goes through:
//! - Setup: load or generate the wallet set
//! - Distribution: fund every wallet from the funding keypair
//! - Burst (optional): concurrent initial purchases, bundled or independent
//! - Steady state: the volume scheduler until completion, cap, or Ctrl-C
//! - Collection: return what is left to the funding wallet

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use vbot_core::{Lamports, RandomSource, StdRandom};
use vbot_executor::{
    BurstConfig, BurstMode, BurstReport, DynBundleRelay, DynTradeExecutor, JitoRelay, MockRelay,
    PurchaseBurst, SimulatedExecutor,
};
use vbot_fleet::{
    CollectionReport, DistributionReport, DynLedger, JsonFileStore, RpcLedger, SimulatedLedger,
    WalletFleet,
};
use vbot_scheduler::{RunSummary, StopHandle, VolumeScheduler};

/// Funding wallet balance in dry-run mode.
const DRY_RUN_FUNDING: Lamports = Lamports(100_000_000_000);

/// Everything one run produced.
#[derive(Debug)]
pub struct RunReport {
    pub distribution: DistributionReport,
    pub burst: Option<BurstReport>,
    pub summary: RunSummary,
    pub collection: Option<CollectionReport>,
}

/// Main application.
pub struct Application {
    config: AppConfig,
    ledger: DynLedger,
    executor: DynTradeExecutor,
    simulated_executor: bool,
    relay: Option<DynBundleRelay>,
    rng: Arc<dyn RandomSource>,
    funding: Arc<Keypair>,
    stop: StopHandle,
}

impl Application {
    /// Validate the configuration and build the collaborators.
    ///
    /// Dry-run mode uses an in-memory ledger with a pre-funded funding
    /// wallet and a mock relay. Trades default to the simulated market;
    /// live mode needs a real executor from [`Application::with_executor`]
    /// since swap execution against the curve lives outside this crate.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        config.validate()?;

        let funding = match config.funding_keypair()? {
            Some(keypair) => keypair,
            None => {
                info!("No funding key configured, using an ephemeral dry-run keypair");
                Keypair::new()
            }
        };

        let ledger: DynLedger = if config.dry_run {
            let ledger = SimulatedLedger::new();
            ledger.set_balance(funding.pubkey(), DRY_RUN_FUNDING);
            Arc::new(ledger)
        } else {
            Arc::new(RpcLedger::new(config.rpc.url.clone(), config.rpc.timeout()))
        };

        let relay: Option<DynBundleRelay> = match (config.burst.enabled, config.burst.mode) {
            (true, BurstMode::Bundle) if config.dry_run => Some(Arc::new(MockRelay::new())),
            (true, BurstMode::Bundle) => Some(Arc::new(JitoRelay::with_timeout(
                config.burst.relay_url.clone(),
                config.burst.relay_timeout(),
            )?)),
            _ => None,
        };

        let rng: Arc<dyn RandomSource> = match config.seed {
            Some(seed) => Arc::new(StdRandom::seeded(seed)),
            None => Arc::new(StdRandom::new()),
        };

        info!(
            dry_run = config.dry_run,
            funding = %funding.pubkey(),
            wallets = config.fleet.wallet_count,
            burst = config.burst.enabled,
            "Application configured"
        );

        Ok(Self {
            config,
            ledger,
            executor: Arc::new(SimulatedExecutor::new()),
            simulated_executor: true,
            relay,
            rng,
            funding: Arc::new(funding),
            stop: StopHandle::new(),
        })
    }

    /// Replace the ledger.
    pub fn with_ledger(mut self, ledger: DynLedger) -> Self {
        self.ledger = ledger;
        self
    }

    /// Replace the market executor.
    pub fn with_executor(mut self, executor: DynTradeExecutor) -> Self {
        self.executor = executor;
        self.simulated_executor = false;
        self
    }

    pub fn with_relay(mut self, relay: DynBundleRelay) -> Self {
        self.relay = Some(relay);
        self
    }

    pub fn with_rng(mut self, rng: Arc<dyn RandomSource>) -> Self {
        self.rng = rng;
        self
    }

    /// Stop handle for the steady-state run. Stopping before the run starts
    /// skips trading entirely but still collects.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn funding_pubkey(&self) -> solana_sdk::pubkey::Pubkey {
        self.funding.pubkey()
    }

    /// Load the wallet set, or generate and save a new one.
    ///
    /// An existing file whose size differs from `fleet.wallet_count` is an
    /// error rather than being overwritten.
    pub fn setup_fleet(&self) -> AppResult<WalletFleet> {
        let store = JsonFileStore::new(&self.config.wallets_file);
        if Path::new(&self.config.wallets_file).exists() {
            let fleet = WalletFleet::load(&store)?;
            if fleet.len() != self.config.fleet.wallet_count {
                return Err(AppError::Config(format!(
                    "{} holds {} wallets, fleet.wallet_count is {}",
                    self.config.wallets_file,
                    fleet.len(),
                    self.config.fleet.wallet_count
                )));
            }
            info!(path = %self.config.wallets_file, wallets = fleet.len(), "Wallet set loaded");
            return Ok(fleet);
        }

        let fleet = WalletFleet::generate(self.config.fleet.wallet_count)?;
        fleet.save(&store)?;
        info!(path = %self.config.wallets_file, wallets = fleet.len(), "Wallet set generated");
        Ok(fleet)
    }

    /// Run the full lifecycle once.
    ///
    /// Live mode with the simulated executor is rejected before the wallet
    /// set is touched or any funds move.
    pub async fn run(self) -> AppResult<RunReport> {
        if !self.config.dry_run && self.simulated_executor {
            return Err(AppError::Config(
                "live mode needs a trade executor; the simulated market only serves dry runs"
                    .to_string(),
            ));
        }

        let mut fleet = self.setup_fleet()?;

        let distribution = fleet
            .distribute(
                self.ledger.as_ref(),
                &self.funding,
                &self.config.fleet,
                self.rng.as_ref(),
            )
            .await?;
        if distribution.succeeded == 0 {
            return Err(AppError::Funding(format!(
                "no wallet was funded ({} transfers failed)",
                distribution.failed
            )));
        }
        if distribution.failed > 0 {
            warn!(
                failed = distribution.failed,
                succeeded = distribution.succeeded,
                "Some wallets were not funded"
            );
        }

        let burst = if self.config.burst.enabled {
            Some(self.run_burst(&fleet).await?)
        } else {
            None
        };

        let summary = self.run_scheduler(&fleet).await?;

        let collection = if self.config.collect_on_finish {
            let report = fleet
                .collect(
                    self.ledger.as_ref(),
                    self.funding.pubkey(),
                    self.config.fleet.reserve,
                )
                .await;
            info!(
                succeeded = report.succeeded,
                failed = report.failed,
                skipped = report.skipped,
                collected = %report.total_collected,
                "Collection finished"
            );
            Some(report)
        } else {
            None
        };

        Ok(RunReport {
            distribution,
            burst,
            summary,
            collection,
        })
    }

    async fn run_burst(&self, fleet: &WalletFleet) -> AppResult<BurstReport> {
        let config = BurstConfig {
            mode: self.config.burst.mode,
            max_concurrency: self.config.burst.max_concurrency,
            tip_account: self.config.burst.tip_account()?.unwrap_or_default(),
            tip_amount: self.config.burst.tip_amount,
            relay_timeout: self.config.burst.relay_timeout(),
        };
        let burst = PurchaseBurst::new(self.executor.clone(), self.relay.clone(), config)?;
        let report = burst
            .run(fleet.wallets(), &self.config.cycle, self.rng.as_ref())
            .await?;

        info!(
            mode = %report.mode.as_str(),
            succeeded = report.succeeded(),
            failed = report.failed(),
            bundled = report.bundle.as_ref().map(|r| r.is_ok()),
            "Burst finished"
        );
        Ok(report)
    }

    async fn run_scheduler(&self, fleet: &WalletFleet) -> AppResult<RunSummary> {
        let mut scheduler = VolumeScheduler::new(
            self.config.cycle.clone(),
            fleet.wallets().to_vec(),
            self.executor.clone(),
            self.rng.clone(),
        )?
        .with_stop_handle(self.stop.clone());

        let stop = self.stop.clone();
        let watcher = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Ctrl-C received, stopping after the current unit");
                stop.stop();
            }
        });

        let result = scheduler.run().await;
        watcher.abort();
        Ok(result?)
    }
}
