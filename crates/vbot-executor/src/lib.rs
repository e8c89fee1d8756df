//! Trade execution for vbot.
//!
//! - `TradeExecutor`: one buy or sell per call against the market
//! - `BundleRelay`: atomic multi-operation submission with a tip
//! - `PurchaseBurst`: concurrent initial purchases, settle-all

pub mod burst;
pub mod error;
pub mod relay;
pub mod trade;

pub use burst::{BurstConfig, BurstMode, BurstReport, PurchaseBurst, PurchaseOutcome, WalletPurchase};
pub use error::{BundleRelayError, ExecutorError, ExecutorResult, RelayResult, TradeError, TradeResult};
pub use relay::{
    submit_with_timeout, BundleReceipt, BundleRelay, BundleRequest, DynBundleRelay, JitoRelay,
    MockRelay, DEFAULT_RELAY_TIMEOUT, DEFAULT_RELAY_URL,
};
pub use trade::{
    DynTradeExecutor, SimulatedExecutor, TradeCall, TradeExecutor, DEFAULT_SIMULATED_LATENCY,
};
