//! Ledger access.
//!
//! The fleet only needs four things from the chain: balances, account
//! lookups, a recent blockhash and a native transfer. [`Ledger`] exposes
//! exactly that, so the RPC-backed and in-memory implementations are
//! interchangeable behind `Arc<dyn Ledger>`.

use crate::error::{LedgerError, LedgerResult};
use dashmap::DashMap;
use parking_lot::Mutex;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    hash::Hash,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    system_instruction, system_program,
    transaction::Transaction,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use vbot_core::{BoxFuture, Lamports};

/// Minimal account view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    pub lamports: Lamports,
    pub owner: Pubkey,
    pub executable: bool,
    pub data_len: usize,
}

/// Ledger capability used by the fleet.
pub trait Ledger: Send + Sync {
    /// Balance of `address`. Unknown accounts have a zero balance.
    fn get_balance(&self, address: Pubkey) -> BoxFuture<'_, LedgerResult<Lamports>>;

    /// Account details, `None` if the account does not exist.
    fn get_account_info(&self, address: Pubkey)
        -> BoxFuture<'_, LedgerResult<Option<AccountInfo>>>;

    /// A recent blockhash for signing.
    fn get_latest_blockhash(&self) -> BoxFuture<'_, LedgerResult<Hash>>;

    /// Move `amount` from `from` to `to` and wait for confirmation.
    fn transfer<'a>(
        &'a self,
        from: &'a Keypair,
        to: Pubkey,
        amount: Lamports,
    ) -> BoxFuture<'a, LedgerResult<Signature>>;
}

/// Arc wrapper for Ledger trait objects.
pub type DynLedger = Arc<dyn Ledger>;

// ============================================================================
// RpcLedger
// ============================================================================

/// JSON-RPC backed ledger.
pub struct RpcLedger {
    client: RpcClient,
    commitment: CommitmentConfig,
}

impl RpcLedger {
    /// Create a new RPC ledger with confirmed commitment.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        let commitment = CommitmentConfig::confirmed();
        Self {
            client: RpcClient::new_with_timeout_and_commitment(url.into(), timeout, commitment),
            commitment,
        }
    }

    /// RPC endpoint URL.
    pub fn url(&self) -> String {
        self.client.url()
    }
}

impl Ledger for RpcLedger {
    fn get_balance(&self, address: Pubkey) -> BoxFuture<'_, LedgerResult<Lamports>> {
        Box::pin(async move {
            self.client
                .get_balance(&address)
                .await
                .map(Lamports)
                .map_err(|e| LedgerError::Rpc(e.to_string()))
        })
    }

    fn get_account_info(
        &self,
        address: Pubkey,
    ) -> BoxFuture<'_, LedgerResult<Option<AccountInfo>>> {
        Box::pin(async move {
            let response = self
                .client
                .get_account_with_commitment(&address, self.commitment)
                .await
                .map_err(|e| LedgerError::Rpc(e.to_string()))?;
            Ok(response.value.map(|account| AccountInfo {
                lamports: Lamports(account.lamports),
                owner: account.owner,
                executable: account.executable,
                data_len: account.data.len(),
            }))
        })
    }

    fn get_latest_blockhash(&self) -> BoxFuture<'_, LedgerResult<Hash>> {
        Box::pin(async move {
            self.client
                .get_latest_blockhash()
                .await
                .map_err(|e| LedgerError::Rpc(e.to_string()))
        })
    }

    fn transfer<'a>(
        &'a self,
        from: &'a Keypair,
        to: Pubkey,
        amount: Lamports,
    ) -> BoxFuture<'a, LedgerResult<Signature>> {
        Box::pin(async move {
            let blockhash = self.get_latest_blockhash().await?;
            let ix = system_instruction::transfer(&from.pubkey(), &to, amount.inner());
            let tx = Transaction::new_signed_with_payer(
                &[ix],
                Some(&from.pubkey()),
                &[from],
                blockhash,
            );
            let signature = self
                .client
                .send_and_confirm_transaction(&tx)
                .await
                .map_err(|e| LedgerError::Rejected(e.to_string()))?;
            debug!(
                from = %from.pubkey(),
                to = %to,
                lamports = amount.inner(),
                %signature,
                "Transfer confirmed"
            );
            Ok(signature)
        })
    }
}

// ============================================================================
// SimulatedLedger
// ============================================================================

/// A confirmed simulated transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRecord {
    pub from: Pubkey,
    pub to: Pubkey,
    pub amount: Lamports,
    pub signature: Signature,
}

/// In-memory ledger for dry runs and tests.
///
/// Transfers debit `amount + fee` from the sender and credit `amount` to
/// the recipient. Failures can be injected per transfer attempt (1-based)
/// or per balance query.
#[derive(Debug, Default)]
pub struct SimulatedLedger {
    balances: DashMap<Pubkey, u64>,
    fee: u64,
    attempts: AtomicU64,
    sequence: AtomicU64,
    transfers: Mutex<Vec<TransferRecord>>,
    failing_attempts: Mutex<HashSet<u64>>,
    failing_balance_queries: Mutex<HashSet<Pubkey>>,
}

impl SimulatedLedger {
    /// Create a new empty ledger with no transfer fee.
    pub fn new() -> Self {
        Self::default()
    }

    /// Charge `fee` lamports to the sender of every transfer.
    pub fn with_fee(mut self, fee: Lamports) -> Self {
        self.fee = fee.inner();
        self
    }

    /// Set an account balance.
    pub fn set_balance(&self, address: Pubkey, amount: Lamports) {
        self.balances.insert(address, amount.inner());
    }

    /// Current balance without going through the trait.
    pub fn balance(&self, address: &Pubkey) -> Lamports {
        Lamports(self.balances.get(address).map(|b| *b).unwrap_or(0))
    }

    /// Make the `n`th transfer attempt (1-based, counted across all callers) fail.
    pub fn fail_transfer_attempt(&self, n: u64) {
        self.failing_attempts.lock().insert(n);
    }

    /// Make balance queries for `address` fail.
    pub fn fail_balance_query(&self, address: Pubkey) {
        self.failing_balance_queries.lock().insert(address);
    }

    /// Confirmed transfers in order.
    pub fn transfers(&self) -> Vec<TransferRecord> {
        self.transfers.lock().clone()
    }

    /// Number of transfer attempts, including failed ones.
    pub fn transfer_attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }

    fn next_signature(&self) -> Signature {
        let n = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let mut bytes = [0u8; 64];
        bytes[..8].copy_from_slice(&n.to_le_bytes());
        Signature::from(bytes)
    }

    fn apply_transfer(&self, from: Pubkey, to: Pubkey, amount: u64) -> LedgerResult<()> {
        let needed = amount.saturating_add(self.fee);
        {
            let mut sender = self.balances.entry(from).or_insert(0);
            if *sender < needed {
                return Err(LedgerError::InsufficientFunds {
                    account: from,
                    needed: Lamports(needed),
                    available: Lamports(*sender),
                });
            }
            *sender -= needed;
        }
        *self.balances.entry(to).or_insert(0) += amount;
        Ok(())
    }
}

impl Ledger for SimulatedLedger {
    fn get_balance(&self, address: Pubkey) -> BoxFuture<'_, LedgerResult<Lamports>> {
        Box::pin(async move {
            if self.failing_balance_queries.lock().contains(&address) {
                return Err(LedgerError::Rpc(format!(
                    "simulated balance query failure for {address}"
                )));
            }
            Ok(self.balance(&address))
        })
    }

    fn get_account_info(
        &self,
        address: Pubkey,
    ) -> BoxFuture<'_, LedgerResult<Option<AccountInfo>>> {
        Box::pin(async move {
            Ok(self.balances.get(&address).map(|b| AccountInfo {
                lamports: Lamports(*b),
                owner: system_program::id(),
                executable: false,
                data_len: 0,
            }))
        })
    }

    fn get_latest_blockhash(&self) -> BoxFuture<'_, LedgerResult<Hash>> {
        Box::pin(async move {
            let n = self.sequence.load(Ordering::SeqCst);
            let mut bytes = [0u8; 32];
            bytes[..8].copy_from_slice(&n.to_le_bytes());
            Ok(Hash::new_from_array(bytes))
        })
    }

    fn transfer<'a>(
        &'a self,
        from: &'a Keypair,
        to: Pubkey,
        amount: Lamports,
    ) -> BoxFuture<'a, LedgerResult<Signature>> {
        Box::pin(async move {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            if self.failing_attempts.lock().contains(&attempt) {
                return Err(LedgerError::Rejected(format!(
                    "simulated failure on transfer attempt {attempt}"
                )));
            }
            let from_key = from.pubkey();
            self.apply_transfer(from_key, to, amount.inner())?;
            let signature = self.next_signature();
            self.transfers.lock().push(TransferRecord {
                from: from_key,
                to,
                amount,
                signature,
            });
            Ok(signature)
        })
    }
}
