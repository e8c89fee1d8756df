//! Wallet-set persistence.
//!
//! On-disk layout:
//!
//! ```json
//! {
//!   "generated": "2024-01-01T00:00:00Z",
//!   "count": 2,
//!   "wallets": [
//!     { "id": 1, "publicKey": "...", "secretKey": "<base58>", "address": "..." }
//!   ]
//! }
//! ```
//!
//! Loading also accepts the bare array written by older tooling,
//! `[{ "name": "...", "secretKey": "<base58>" }]`. Ids follow array order
//! and public keys are derived from the secrets.

use crate::error::{FleetError, FleetResult};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use solana_sdk::signature::{Keypair, Signer};
use std::path::{Path, PathBuf};
use tracing::info;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// One persisted wallet. The secret is wiped from memory on drop.
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
pub struct WalletRecord {
    pub id: u32,
    pub public_key: String,
    pub secret_key: String,
    pub address: String,
}

impl std::fmt::Debug for WalletRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletRecord")
            .field("id", &self.id)
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Persisted wallet set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletSet {
    pub generated: DateTime<Utc>,
    pub count: usize,
    pub wallets: Vec<WalletRecord>,
}

/// Entry of the bare-array layout.
#[derive(Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
struct LegacyWalletRecord {
    name: String,
    secret_key: String,
}

impl LegacyWalletRecord {
    fn into_record(self, id: u32) -> Result<WalletRecord, String> {
        let mut bytes = bs58::decode(&self.secret_key)
            .into_vec()
            .map_err(|e| format!("wallet {}: bad secret key: {e}", self.name))?;
        let keypair = Keypair::try_from(&bytes[..])
            .map_err(|e| format!("wallet {}: bad secret key: {e}", self.name));
        bytes.zeroize();
        let address = keypair?.pubkey().to_string();
        Ok(WalletRecord {
            id,
            public_key: address.clone(),
            secret_key: self.secret_key.clone(),
            address,
        })
    }
}

/// Parse either on-disk layout.
fn parse_wallet_set(text: &str) -> Result<WalletSet, String> {
    let value: serde_json::Value = serde_json::from_str(text).map_err(|e| e.to_string())?;
    if !value.is_array() {
        return serde_json::from_value(value).map_err(|e| e.to_string());
    }

    let legacy: Vec<LegacyWalletRecord> =
        serde_json::from_value(value).map_err(|e| e.to_string())?;
    let wallets = legacy
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            let id = u32::try_from(index + 1).map_err(|e| e.to_string())?;
            record.into_record(id)
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(WalletSet {
        generated: DateTime::<Utc>::default(),
        count: wallets.len(),
        wallets,
    })
}

/// Wallet-set persistence capability.
pub trait WalletStore: Send + Sync {
    fn load(&self) -> FleetResult<WalletSet>;

    fn save(&self, set: &WalletSet) -> FleetResult<()>;
}

// ============================================================================
// JsonFileStore
// ============================================================================

/// JSON file store.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl WalletStore for JsonFileStore {
    fn load(&self) -> FleetResult<WalletSet> {
        let text = std::fs::read_to_string(&self.path)
            .map_err(|e| FleetError::Load(format!("{}: {e}", self.path.display())))?;
        parse_wallet_set(&text)
            .map_err(|e| FleetError::Load(format!("{}: {e}", self.path.display())))
    }

    fn save(&self, set: &WalletSet) -> FleetResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| FleetError::Save(format!("{}: {e}", parent.display())))?;
        }
        let text =
            serde_json::to_string_pretty(set).map_err(|e| FleetError::Save(e.to_string()))?;
        std::fs::write(&self.path, text)
            .map_err(|e| FleetError::Save(format!("{}: {e}", self.path.display())))?;
        info!(path = %self.path.display(), count = set.count, "Wallet set saved");
        Ok(())
    }
}

// ============================================================================
// MemoryStore
// ============================================================================

/// In-memory store holding the serialized JSON text.
#[derive(Debug, Default)]
pub struct MemoryStore {
    text: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with raw JSON.
    pub fn with_json(text: impl Into<String>) -> Self {
        Self {
            text: Mutex::new(Some(text.into())),
        }
    }

    /// Raw JSON currently held.
    pub fn json(&self) -> Option<String> {
        self.text.lock().clone()
    }
}

impl WalletStore for MemoryStore {
    fn load(&self) -> FleetResult<WalletSet> {
        let guard = self.text.lock();
        let text = guard
            .as_deref()
            .ok_or_else(|| FleetError::Load("memory store is empty".to_string()))?;
        parse_wallet_set(text).map_err(FleetError::Load)
    }

    fn save(&self, set: &WalletSet) -> FleetResult<()> {
        let text =
            serde_json::to_string_pretty(set).map_err(|e| FleetError::Save(e.to_string()))?;
        *self.text.lock() = Some(text);
        Ok(())
    }
}
