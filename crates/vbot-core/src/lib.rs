//! Core domain types for the vbot fleet engine.
//!
//! This crate provides the fundamental types shared by every other crate:
//! - `Lamports`: Base-unit amounts with exact SOL conversion
//! - `Wallet`, `WalletId`: Opaque fleet wallet handles
//! - `FleetConfig`, `CycleConfig`: Operator-supplied run parameters
//! - `RandomSource`: Injectable uniform sampler
//! - `TradeSide`, `TradeReceipt`, `SignedOperation`: Trade results

pub mod config;
pub mod error;
pub mod lamports;
pub mod random;
pub mod trade;
pub mod wallet;

pub use config::{
    CycleConfig, CycleScope, FleetConfig, LegacyBotConfig, RangeBound, UniformRange,
};
pub use error::{CoreError, Result};
pub use lamports::{Lamports, LAMPORTS_PER_SOL};
pub use random::{RandomSource, ScriptedRandom, StdRandom};
pub use trade::{SignedOperation, TradeReceipt, TradeSide};
pub use wallet::{Wallet, WalletId};

/// Re-exported ledger primitives so downstream crates agree on one version.
pub use solana_sdk::pubkey::Pubkey;

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> =
    std::pin::Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;
