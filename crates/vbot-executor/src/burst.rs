//! Concurrent initial purchase burst.
//!
//! Every wallet gets its own size, price bump and start delay, sampled up
//! front in wallet order. Purchases then run concurrently with at most
//! `max_concurrency` in flight. The burst awaits every task: one failure
//! never cancels its siblings.
//!
//! In `Bundle` mode each task only prepares its signed buy; once all tasks
//! have settled the successful operations are submitted as one bundle.

use crate::error::{BundleRelayError, ExecutorError, ExecutorResult, TradeError};
use crate::relay::{submit_with_timeout, BundleReceipt, BundleRequest, DynBundleRelay};
use crate::trade::DynTradeExecutor;
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use vbot_core::{
    CycleConfig, Lamports, RandomSource, SignedOperation, TradeReceipt, Wallet, WalletId,
};
use vbot_telemetry::Metrics;

/// How burst purchases reach the market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BurstMode {
    /// Each wallet buys on its own after its delay.
    #[default]
    Independent,
    /// Buys are prepared and landed together as one bundle.
    Bundle,
}

impl BurstMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Independent => "independent",
            Self::Bundle => "bundle",
        }
    }
}

/// Burst parameters.
#[derive(Debug, Clone)]
pub struct BurstConfig {
    pub mode: BurstMode,
    /// Purchases in flight at once. `None` means one per wallet.
    pub max_concurrency: Option<usize>,
    pub tip_account: Pubkey,
    pub tip_amount: Lamports,
    pub relay_timeout: Duration,
}

/// Sampled parameters for one wallet.
#[derive(Debug, Clone)]
struct PurchasePlan {
    wallet: Wallet,
    size: Lamports,
    price_bump: f64,
    delay: Duration,
}

/// What one purchase task produced.
#[derive(Debug, Clone)]
pub enum PurchaseOutcome {
    Bought(TradeReceipt),
    Prepared(SignedOperation),
    Failed(TradeError),
}

impl PurchaseOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }
}

/// Per-wallet result.
#[derive(Debug, Clone)]
pub struct WalletPurchase {
    pub wallet: WalletId,
    pub size: Lamports,
    pub price_bump: f64,
    pub delay: Duration,
    pub outcome: PurchaseOutcome,
}

/// Outcome of [`PurchaseBurst::run`].
#[derive(Debug, Clone)]
pub struct BurstReport {
    pub mode: BurstMode,
    /// Sorted by wallet id.
    pub purchases: Vec<WalletPurchase>,
    /// Tasks that panicked or were cancelled by the runtime.
    pub lost_tasks: usize,
    /// Bundle submission result, `Bundle` mode only.
    pub bundle: Option<Result<BundleReceipt, BundleRelayError>>,
}

impl BurstReport {
    pub fn succeeded(&self) -> usize {
        self.purchases
            .iter()
            .filter(|p| p.outcome.is_success())
            .count()
    }

    pub fn failed(&self) -> usize {
        self.purchases.len() - self.succeeded() + self.lost_tasks
    }
}

/// Bounded-concurrency purchase burst.
pub struct PurchaseBurst {
    executor: DynTradeExecutor,
    relay: Option<DynBundleRelay>,
    config: BurstConfig,
}

impl PurchaseBurst {
    /// Create a burst. `Bundle` mode requires a relay.
    pub fn new(
        executor: DynTradeExecutor,
        relay: Option<DynBundleRelay>,
        config: BurstConfig,
    ) -> ExecutorResult<Self> {
        if config.mode == BurstMode::Bundle && relay.is_none() {
            return Err(ExecutorError::MissingRelay);
        }
        Ok(Self {
            executor,
            relay,
            config,
        })
    }

    /// Run one purchase per wallet and wait for all of them.
    pub async fn run(
        &self,
        wallets: &[Wallet],
        cycle: &CycleConfig,
        rng: &dyn RandomSource,
    ) -> ExecutorResult<BurstReport> {
        cycle.sol_amount_lamports.validate("sol_amount_lamports")?;
        cycle.price_bump.validate("price_bump")?;
        cycle.bundle_delay_ms.validate("bundle_delay_ms")?;

        let mode = self.config.mode;
        let plans: Vec<PurchasePlan> = wallets
            .iter()
            .map(|wallet| PurchasePlan {
                wallet: wallet.clone(),
                size: Lamports(rng.sample_u64(&cycle.sol_amount_lamports)),
                price_bump: rng.sample_f64(&cycle.price_bump),
                delay: rng.duration_ms(&cycle.bundle_delay_ms),
            })
            .collect();

        let permits = self
            .config
            .max_concurrency
            .unwrap_or(wallets.len())
            .max(1);
        let semaphore = Arc::new(Semaphore::new(permits));
        info!(
            mode = mode.as_str(),
            wallets = plans.len(),
            max_concurrency = permits,
            "Starting purchase burst"
        );

        let mut tasks = JoinSet::new();
        for plan in plans {
            let executor = Arc::clone(&self.executor);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                if !plan.delay.is_zero() {
                    tokio::time::sleep(plan.delay).await;
                }
                let outcome = match semaphore.acquire_owned().await {
                    Ok(_permit) => match mode {
                        BurstMode::Independent => executor
                            .buy(&plan.wallet, plan.size, plan.price_bump)
                            .await
                            .map_or_else(PurchaseOutcome::Failed, PurchaseOutcome::Bought),
                        BurstMode::Bundle => executor
                            .prepare_buy(&plan.wallet, plan.size, plan.price_bump)
                            .await
                            .map_or_else(PurchaseOutcome::Failed, PurchaseOutcome::Prepared),
                    },
                    Err(e) => PurchaseOutcome::Failed(TradeError::Task(e.to_string())),
                };
                WalletPurchase {
                    wallet: plan.wallet.id,
                    size: plan.size,
                    price_bump: plan.price_bump,
                    delay: plan.delay,
                    outcome,
                }
            });
        }

        let mut purchases = Vec::with_capacity(wallets.len());
        let mut lost_tasks = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(purchase) => {
                    Metrics::burst_purchase(mode.as_str(), purchase.outcome.is_success());
                    match &purchase.outcome {
                        PurchaseOutcome::Failed(error) => {
                            warn!(wallet = %purchase.wallet, error = %error, "Burst purchase failed")
                        }
                        _ => debug!(wallet = %purchase.wallet, size = %purchase.size, "Burst purchase done"),
                    }
                    purchases.push(purchase);
                }
                Err(e) => {
                    lost_tasks += 1;
                    Metrics::burst_purchase(mode.as_str(), false);
                    warn!(error = %e, "Burst purchase task lost");
                }
            }
        }
        purchases.sort_by_key(|p| p.wallet);

        let bundle = match (mode, &self.relay) {
            (BurstMode::Bundle, Some(relay)) => {
                let operations: Vec<SignedOperation> = purchases
                    .iter()
                    .filter_map(|p| match &p.outcome {
                        PurchaseOutcome::Prepared(op) => Some(op.clone()),
                        _ => None,
                    })
                    .collect();
                let request = BundleRequest {
                    operations,
                    tip_account: self.config.tip_account,
                    tip_amount: self.config.tip_amount,
                };
                Some(submit_with_timeout(relay.as_ref(), request, self.config.relay_timeout).await)
            }
            _ => None,
        };

        let report = BurstReport {
            mode,
            purchases,
            lost_tasks,
            bundle,
        };
        info!(
            mode = mode.as_str(),
            succeeded = report.succeeded(),
            failed = report.failed(),
            "Purchase burst finished"
        );
        Ok(report)
    }
}
