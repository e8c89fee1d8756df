//! Trade executor trait and the simulated market.
//!
//! The scheduler never retries: each call is one attempt, and a failure is
//! terminal for that unit only.

use crate::error::{TradeError, TradeResult};
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;
use vbot_core::{BoxFuture, Lamports, SignedOperation, TradeReceipt, TradeSide, Wallet, WalletId};

/// Market access for one wallet at a time.
pub trait TradeExecutor: Send + Sync {
    /// Buy `size` worth of the token with a price-impact target of `price_bump`.
    fn buy<'a>(
        &'a self,
        wallet: &'a Wallet,
        size: Lamports,
        price_bump: f64,
    ) -> BoxFuture<'a, TradeResult<TradeReceipt>>;

    /// Sell the wallet's position with a price-impact target of `price_bump`.
    fn sell<'a>(&'a self, wallet: &'a Wallet, price_bump: f64)
        -> BoxFuture<'a, TradeResult<TradeReceipt>>;

    /// Build and sign a buy without submitting it, for bundling.
    fn prepare_buy<'a>(
        &'a self,
        wallet: &'a Wallet,
        size: Lamports,
        price_bump: f64,
    ) -> BoxFuture<'a, TradeResult<SignedOperation>>;
}

/// Arc wrapper for TradeExecutor trait objects.
pub type DynTradeExecutor = Arc<dyn TradeExecutor>;

// ============================================================================
// SimulatedExecutor
// ============================================================================

/// Default simulated confirmation latency.
pub const DEFAULT_SIMULATED_LATENCY: Duration = Duration::from_millis(100);

/// One call seen by the simulated executor.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeCall {
    pub wallet: WalletId,
    pub side: TradeSide,
    /// Buy size; `None` for sells.
    pub size: Option<Lamports>,
    pub price_bump: f64,
    /// `true` for `prepare_buy`.
    pub prepared: bool,
    pub succeeded: bool,
    /// When the call started.
    pub at: Instant,
}

/// Paper-trading executor.
///
/// Every call sleeps `latency` and then succeeds unless the failure plan
/// says otherwise. Sells return the size of the wallet's open buy.
#[derive(Debug)]
pub struct SimulatedExecutor {
    latency: Duration,
    always_fail: Mutex<HashSet<(WalletId, TradeSide)>>,
    fail_once: Mutex<HashSet<(WalletId, TradeSide)>>,
    open: DashMap<WalletId, Lamports>,
    calls: Mutex<Vec<TradeCall>>,
    sequence: AtomicU64,
}

impl Default for SimulatedExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedExecutor {
    /// Create a new simulated executor with the default latency.
    pub fn new() -> Self {
        Self::with_latency(DEFAULT_SIMULATED_LATENCY)
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            always_fail: Mutex::new(HashSet::new()),
            fail_once: Mutex::new(HashSet::new()),
            open: DashMap::new(),
            calls: Mutex::new(Vec::new()),
            sequence: AtomicU64::new(0),
        }
    }

    /// Fail every `side` call for `wallet`.
    pub fn fail_always(&self, wallet: WalletId, side: TradeSide) {
        self.always_fail.lock().insert((wallet, side));
    }

    /// Fail the next `side` call for `wallet`.
    pub fn fail_once(&self, wallet: WalletId, side: TradeSide) {
        self.fail_once.lock().insert((wallet, side));
    }

    /// Recorded calls in start order.
    pub fn calls(&self) -> Vec<TradeCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self, side: TradeSide) -> usize {
        self.calls.lock().iter().filter(|c| c.side == side).count()
    }

    fn should_fail(&self, wallet: WalletId, side: TradeSide) -> bool {
        if self.always_fail.lock().contains(&(wallet, side)) {
            return true;
        }
        self.fail_once.lock().remove(&(wallet, side))
    }

    fn next_signature(&self, wallet: WalletId, side: TradeSide) -> String {
        let n = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        format!("sim-{side}-{wallet}-{n}")
    }

    /// Shared path for all three calls.
    async fn execute(
        &self,
        wallet: WalletId,
        side: TradeSide,
        size: Option<Lamports>,
        price_bump: f64,
        prepared: bool,
    ) -> TradeResult<String> {
        let at = Instant::now();
        let failed = self.should_fail(wallet, side);
        self.calls.lock().push(TradeCall {
            wallet,
            side,
            size,
            price_bump,
            prepared,
            succeeded: !failed,
            at,
        });

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if failed {
            return Err(TradeError::Rejected {
                wallet,
                side,
                reason: "simulated failure".to_string(),
            });
        }
        Ok(self.next_signature(wallet, side))
    }
}

impl TradeExecutor for SimulatedExecutor {
    fn buy<'a>(
        &'a self,
        wallet: &'a Wallet,
        size: Lamports,
        price_bump: f64,
    ) -> BoxFuture<'a, TradeResult<TradeReceipt>> {
        Box::pin(async move {
            let signature = self
                .execute(wallet.id, TradeSide::Buy, Some(size), price_bump, false)
                .await?;
            *self.open.entry(wallet.id).or_insert(Lamports::ZERO) += size;
            debug!(wallet = %wallet, %size, price_bump, %signature, "Simulated buy");
            Ok(TradeReceipt {
                wallet: wallet.id,
                side: TradeSide::Buy,
                amount: size,
                price_bump,
                signature,
                executed_at: Utc::now(),
            })
        })
    }

    fn sell<'a>(
        &'a self,
        wallet: &'a Wallet,
        price_bump: f64,
    ) -> BoxFuture<'a, TradeResult<TradeReceipt>> {
        Box::pin(async move {
            let signature = self
                .execute(wallet.id, TradeSide::Sell, None, price_bump, false)
                .await?;
            let amount = self
                .open
                .remove(&wallet.id)
                .map(|(_, size)| size)
                .unwrap_or(Lamports::ZERO);
            debug!(wallet = %wallet, %amount, price_bump, %signature, "Simulated sell");
            Ok(TradeReceipt {
                wallet: wallet.id,
                side: TradeSide::Sell,
                amount,
                price_bump,
                signature,
                executed_at: Utc::now(),
            })
        })
    }

    fn prepare_buy<'a>(
        &'a self,
        wallet: &'a Wallet,
        size: Lamports,
        price_bump: f64,
    ) -> BoxFuture<'a, TradeResult<SignedOperation>> {
        Box::pin(async move {
            let signature = self
                .execute(wallet.id, TradeSide::Buy, Some(size), price_bump, true)
                .await?;
            let payload = format!("{signature}:{}:{}", wallet.address, size.inner());
            Ok(SignedOperation::new(bs58::encode(payload).into_string()))
        })
    }
}
