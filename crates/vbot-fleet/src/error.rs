//! Fleet and ledger error types.

use solana_sdk::pubkey::Pubkey;
use thiserror::Error;
use vbot_core::{CoreError, Lamports, WalletId};

/// Ledger access and transfer errors.
///
/// Per-wallet transfer failures carry one of these; they are recorded in a
/// report and never abort the surrounding loop.
#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Insufficient funds in {account}: need {needed}, have {available}")]
    InsufficientFunds {
        account: Pubkey,
        needed: Lamports,
        available: Lamports,
    },

    #[error("Transfer rejected: {0}")]
    Rejected(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Fleet errors. All are raised before funds move.
#[derive(Debug, Error)]
pub enum FleetError {
    #[error("Validation error: {0}")]
    Validation(#[from] CoreError),

    #[error("Fleet load failed: {0}")]
    Load(String),

    #[error("Fleet save failed: {0}")]
    Save(String),

    #[error("Unknown wallet: {0}")]
    UnknownWallet(WalletId),
}

pub type FleetResult<T> = Result<T, FleetError>;
