//! Wallet fleet lifecycle for vbot.
//!
//! - `Ledger`: balance, account, blockhash and transfer access
//! - `KeyStore`: keypairs referenced by `WalletId`
//! - `WalletStore`: wallet-set persistence (JSON)
//! - `WalletFleet`: generate, load, save, distribute, collect

pub mod error;
pub mod fleet;
pub mod keystore;
pub mod ledger;
pub mod store;

pub use error::{FleetError, FleetResult, LedgerError, LedgerResult};
pub use fleet::{
    CollectionReport, DistributionReport, TransferFailure, WalletFleet, COLLECT_KIND,
    DISTRIBUTE_KIND,
};
pub use keystore::KeyStore;
pub use ledger::{AccountInfo, DynLedger, Ledger, RpcLedger, SimulatedLedger, TransferRecord};
pub use store::{JsonFileStore, MemoryStore, WalletRecord, WalletSet, WalletStore};
