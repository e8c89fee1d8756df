//! Keypair material, referenced by wallet id.

use crate::error::{FleetError, FleetResult};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use std::collections::BTreeMap;
use std::sync::Arc;
use vbot_core::WalletId;

/// Keypairs owned by a fleet.
///
/// Keys are shared out as `Arc<Keypair>` so concurrent purchase tasks can
/// sign without borrowing the fleet.
#[derive(Default)]
pub struct KeyStore {
    keys: BTreeMap<WalletId, Arc<Keypair>>,
}

impl KeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a keypair under `id`, returning its public key.
    pub fn insert(&mut self, id: WalletId, keypair: Keypair) -> Pubkey {
        let pubkey = keypair.pubkey();
        self.keys.insert(id, Arc::new(keypair));
        pubkey
    }

    pub fn get(&self, id: WalletId) -> Option<Arc<Keypair>> {
        self.keys.get(&id).cloned()
    }

    /// Like [`get`](Self::get) but fails with `UnknownWallet`.
    pub fn require(&self, id: WalletId) -> FleetResult<Arc<Keypair>> {
        self.get(id).ok_or(FleetError::UnknownWallet(id))
    }

    /// Secret key of `id` in base58.
    pub fn secret_base58(&self, id: WalletId) -> FleetResult<String> {
        Ok(self.require(id)?.to_base58_string())
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl std::fmt::Debug for KeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material.
        f.debug_struct("KeyStore")
            .field("wallets", &self.keys.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_lookup() {
        let mut store = KeyStore::new();
        let kp = Keypair::new();
        let expected = kp.pubkey();
        let pubkey = store.insert(WalletId::new(1), kp);

        assert_eq!(pubkey, expected);
        assert_eq!(store.get(WalletId::new(1)).unwrap().pubkey(), expected);
        assert!(store.get(WalletId::new(2)).is_none());
        assert!(matches!(
            store.require(WalletId::new(2)),
            Err(FleetError::UnknownWallet(_))
        ));
    }

    #[test]
    fn test_debug_hides_secrets() {
        let mut store = KeyStore::new();
        store.insert(WalletId::new(1), Keypair::new());
        let secret = store.secret_base58(WalletId::new(1)).unwrap();
        assert!(!format!("{store:?}").contains(&secret));
    }
}
