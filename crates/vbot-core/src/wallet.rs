//! Fleet wallet handles.
//!
//! A `Wallet` is an opaque handle: it names an address and carries a
//! balance cache, but never holds key material. Keys live in the fleet's
//! key store and are looked up by [`WalletId`].

use crate::Lamports;
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::fmt;

/// Wallet identifier, 1-based within a fleet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletId(pub u32);

impl WalletId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn index(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w{}", self.0)
    }
}

/// Fleet wallet handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wallet {
    pub id: WalletId,
    pub address: Pubkey,
    /// Last known balance; `None` until first funded or refreshed.
    pub cached_balance: Option<Lamports>,
}

impl Wallet {
    /// Create a new wallet handle with an empty balance cache.
    #[must_use]
    pub fn new(id: WalletId, address: Pubkey) -> Self {
        Self {
            id,
            address,
            cached_balance: None,
        }
    }

    /// Cached balance, treating an unknown balance as zero.
    pub fn balance_or_zero(&self) -> Lamports {
        self.cached_balance.unwrap_or(Lamports::ZERO)
    }

    /// Short form of the address for log lines.
    pub fn short_address(&self) -> String {
        let s = self.address.to_string();
        if s.len() <= 8 {
            return s;
        }
        format!("{}..{}", &s[..4], &s[s.len() - 4..])
    }
}

impl fmt::Display for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.id, self.short_address())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wallet_display() {
        let w = Wallet::new(WalletId::new(3), Pubkey::new_unique());
        let shown = w.to_string();
        assert!(shown.starts_with("w3("));
        assert!(shown.contains(".."));
    }

    #[test]
    fn test_balance_or_zero() {
        let mut w = Wallet::new(WalletId::new(1), Pubkey::new_unique());
        assert_eq!(w.balance_or_zero(), Lamports::ZERO);
        w.cached_balance = Some(Lamports(10));
        assert_eq!(w.balance_or_zero(), Lamports(10));
    }
}
