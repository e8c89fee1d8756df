//! Wallet fleet lifecycle.
//!
//! A fleet is a set of ephemeral wallets used to spread trades across
//! distinct identities. The fleet owns every wallet handle and its keypair;
//! everything else refers to wallets by id or by cloned handle.

use crate::error::{FleetError, FleetResult, LedgerError};
use crate::keystore::KeyStore;
use crate::ledger::Ledger;
use crate::store::{WalletRecord, WalletSet, WalletStore};
use chrono::Utc;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};
use vbot_core::{
    CoreError, FleetConfig, Lamports, RandomSource, UniformRange, Wallet, WalletId,
};
use vbot_telemetry::Metrics;

/// Metric label for funding transfers.
pub const DISTRIBUTE_KIND: &str = "distribute";
/// Metric label for collection transfers.
pub const COLLECT_KIND: &str = "collect";

/// A per-wallet transfer that did not go through.
#[derive(Debug, Clone)]
pub struct TransferFailure {
    pub wallet: WalletId,
    pub error: LedgerError,
}

/// Outcome of [`WalletFleet::distribute`].
#[derive(Debug, Clone, Default)]
pub struct DistributionReport {
    pub succeeded: usize,
    pub failed: usize,
    pub total_distributed: Lamports,
    pub failures: Vec<TransferFailure>,
}

impl DistributionReport {
    pub fn attempted(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Outcome of [`WalletFleet::collect`].
#[derive(Debug, Clone, Default)]
pub struct CollectionReport {
    pub succeeded: usize,
    pub failed: usize,
    /// Wallets at or below the reserve.
    pub skipped: usize,
    pub total_collected: Lamports,
    pub failures: Vec<TransferFailure>,
}

/// The managed set of ephemeral wallets.
#[derive(Debug)]
pub struct WalletFleet {
    wallets: Vec<Wallet>,
    keys: KeyStore,
}

impl WalletFleet {
    // =========================================================================
    // Construction
    // =========================================================================

    /// Create `n` fresh wallets with ids `1..=n`.
    pub fn generate(n: usize) -> FleetResult<Self> {
        if n == 0 {
            return Err(FleetError::Validation(CoreError::InvalidConfig(
                "fleet size must be at least 1".to_string(),
            )));
        }
        let mut keys = KeyStore::new();
        let wallets = (1..=n as u32)
            .map(|i| {
                let id = WalletId::new(i);
                let address = keys.insert(id, Keypair::new());
                Wallet::new(id, address)
            })
            .collect();
        info!(count = n, "Generated wallet fleet");
        Ok(Self { wallets, keys })
    }

    /// Restore a fleet from a persisted wallet set.
    pub fn load(store: &dyn WalletStore) -> FleetResult<Self> {
        let set = store.load()?;
        let fleet = Self::from_wallet_set(&set)?;
        info!(count = fleet.len(), generated = %set.generated, "Loaded wallet fleet");
        Ok(fleet)
    }

    /// Build a fleet from a wallet set, checking every record.
    pub fn from_wallet_set(set: &WalletSet) -> FleetResult<Self> {
        if set.count == 0 || set.wallets.is_empty() {
            return Err(FleetError::Load("wallet set is empty".to_string()));
        }
        if set.count != set.wallets.len() {
            return Err(FleetError::Load(format!(
                "count {} does not match {} wallet entries",
                set.count,
                set.wallets.len()
            )));
        }

        let mut keys = KeyStore::new();
        let mut wallets = Vec::with_capacity(set.wallets.len());
        for record in &set.wallets {
            let id = WalletId::new(record.id);
            if keys.get(id).is_some() {
                return Err(FleetError::Load(format!("duplicate wallet id {}", record.id)));
            }
            let keypair = decode_keypair(record)?;
            let expected = Pubkey::from_str(&record.public_key).map_err(|e| {
                FleetError::Load(format!("wallet {}: bad public key: {e}", record.id))
            })?;
            if keypair.pubkey() != expected {
                return Err(FleetError::Load(format!(
                    "wallet {}: public key does not match secret key",
                    record.id
                )));
            }
            let address = keys.insert(id, keypair);
            wallets.push(Wallet::new(id, address));
        }
        wallets.sort_by_key(|w| w.id);
        Ok(Self { wallets, keys })
    }

    /// Serialize into the persistence layout.
    pub fn to_wallet_set(&self) -> FleetResult<WalletSet> {
        let wallets = self
            .wallets
            .iter()
            .map(|w| {
                let address = w.address.to_string();
                Ok(WalletRecord {
                    id: w.id.index(),
                    public_key: address.clone(),
                    secret_key: self.keys.secret_base58(w.id)?,
                    address,
                })
            })
            .collect::<FleetResult<Vec<_>>>()?;
        Ok(WalletSet {
            generated: Utc::now(),
            count: wallets.len(),
            wallets,
        })
    }

    /// Persist the fleet.
    pub fn save(&self, store: &dyn WalletStore) -> FleetResult<()> {
        store.save(&self.to_wallet_set()?)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn wallets(&self) -> &[Wallet] {
        &self.wallets
    }

    pub fn len(&self) -> usize {
        self.wallets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wallets.is_empty()
    }

    pub fn wallet(&self, id: WalletId) -> Option<&Wallet> {
        self.wallets.iter().find(|w| w.id == id)
    }

    /// Keypair for `id`.
    pub fn keypair(&self, id: WalletId) -> Option<Arc<Keypair>> {
        self.keys.get(id)
    }

    /// Sum of the balance cache.
    pub fn total_cached_balance(&self) -> Lamports {
        self.wallets.iter().map(Wallet::balance_or_zero).sum()
    }

    // =========================================================================
    // Funding
    // =========================================================================

    /// Fund every wallet from `funding`.
    ///
    /// Wallets are funded in id order with an amount sampled from
    /// `config.funding_lamports`, then a delay from `config.transfer_delay_ms`
    /// is slept before the next wallet. A failed transfer is recorded and the
    /// loop moves on.
    pub async fn distribute(
        &mut self,
        ledger: &dyn Ledger,
        funding: &Keypair,
        config: &FleetConfig,
        rng: &dyn RandomSource,
    ) -> FleetResult<DistributionReport> {
        config.validate()?;
        if config.wallet_count != self.wallets.len() {
            return Err(FleetError::Validation(CoreError::InvalidConfig(format!(
                "wallet_count {} does not match fleet size {}",
                config.wallet_count,
                self.wallets.len()
            ))));
        }

        info!(
            wallets = self.wallets.len(),
            funding = %funding.pubkey(),
            "Distributing funds"
        );

        let mut report = DistributionReport::default();
        let last = self.wallets.len() - 1;
        for (i, wallet) in self.wallets.iter_mut().enumerate() {
            let amount = Lamports(rng.sample_u64(&config.funding_lamports));
            match ledger.transfer(funding, wallet.address, amount).await {
                Ok(signature) => {
                    report.succeeded += 1;
                    report.total_distributed += amount;
                    wallet.cached_balance = Some(wallet.balance_or_zero() + amount);
                    Metrics::fleet_transfer(DISTRIBUTE_KIND, true, amount);
                    info!(wallet = %wallet, %amount, %signature, "Funded wallet");
                }
                Err(error) => {
                    report.failed += 1;
                    Metrics::fleet_transfer(DISTRIBUTE_KIND, false, amount);
                    warn!(wallet = %wallet, %amount, error = %error, "Funding transfer failed");
                    report.failures.push(TransferFailure {
                        wallet: wallet.id,
                        error,
                    });
                }
            }

            if i < last {
                sleep_sampled(rng, &config.transfer_delay_ms).await;
            }
        }

        info!(
            succeeded = report.succeeded,
            failed = report.failed,
            total = %report.total_distributed,
            "Distribution finished"
        );
        Ok(report)
    }

    /// Return every wallet's balance above `reserve` to `destination`.
    ///
    /// Balances are read from the ledger at collection time. Wallets at or
    /// below the reserve are skipped. A failed balance query or transfer is
    /// recorded and the loop moves on.
    pub async fn collect(
        &mut self,
        ledger: &dyn Ledger,
        destination: Pubkey,
        reserve: Lamports,
    ) -> CollectionReport {
        info!(wallets = self.wallets.len(), %destination, %reserve, "Collecting funds");

        let mut report = CollectionReport::default();
        for wallet in &mut self.wallets {
            let balance = match ledger.get_balance(wallet.address).await {
                Ok(balance) => balance,
                Err(error) => {
                    report.failed += 1;
                    Metrics::fleet_transfer(COLLECT_KIND, false, Lamports::ZERO);
                    warn!(wallet = %wallet, error = %error, "Balance query failed");
                    report.failures.push(TransferFailure {
                        wallet: wallet.id,
                        error,
                    });
                    continue;
                }
            };
            wallet.cached_balance = Some(balance);

            if balance <= reserve {
                report.skipped += 1;
                Metrics::fleet_transfer_skipped(COLLECT_KIND);
                debug!(wallet = %wallet, %balance, "At or below reserve, skipping");
                continue;
            }

            let Some(keypair) = self.keys.get(wallet.id) else {
                // from_wallet_set and generate always insert a key per wallet.
                report.failed += 1;
                warn!(wallet = %wallet, "No keypair for wallet");
                continue;
            };

            let amount = balance - reserve;
            match ledger.transfer(&keypair, destination, amount).await {
                Ok(signature) => {
                    report.succeeded += 1;
                    report.total_collected += amount;
                    wallet.cached_balance = Some(reserve);
                    Metrics::fleet_transfer(COLLECT_KIND, true, amount);
                    info!(wallet = %wallet, %amount, %signature, "Collected from wallet");
                }
                Err(error) => {
                    report.failed += 1;
                    Metrics::fleet_transfer(COLLECT_KIND, false, amount);
                    warn!(wallet = %wallet, %amount, error = %error, "Collection transfer failed");
                    report.failures.push(TransferFailure {
                        wallet: wallet.id,
                        error,
                    });
                }
            }
        }

        info!(
            succeeded = report.succeeded,
            failed = report.failed,
            skipped = report.skipped,
            total = %report.total_collected,
            "Collection finished"
        );
        report
    }

    /// Re-read every balance into the cache. Failures leave the cache as is.
    pub async fn refresh_balances(&mut self, ledger: &dyn Ledger) {
        for wallet in &mut self.wallets {
            match ledger.get_balance(wallet.address).await {
                Ok(balance) => wallet.cached_balance = Some(balance),
                Err(error) => warn!(wallet = %wallet, error = %error, "Balance refresh failed"),
            }
        }
    }
}

fn decode_keypair(record: &WalletRecord) -> FleetResult<Keypair> {
    let mut bytes = bs58::decode(&record.secret_key)
        .into_vec()
        .map_err(|e| FleetError::Load(format!("wallet {}: bad secret key: {e}", record.id)))?;
    let keypair = Keypair::try_from(&bytes[..])
        .map_err(|e| FleetError::Load(format!("wallet {}: bad secret key: {e}", record.id)));
    zeroize::Zeroize::zeroize(&mut bytes);
    keypair
}

async fn sleep_sampled(rng: &dyn RandomSource, range: &UniformRange<u64>) {
    let delay = rng.duration_ms(range);
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
