//! Run parameters for the fleet and the trade-cycle scheduler.
//!
//! `FleetConfig` governs funding and collection, `CycleConfig` governs the
//! trading loop. Both deserialize from TOML sections with defaults for every
//! field. `LegacyBotConfig` reads the older `bot.json` layout.

use crate::{CoreError, Lamports, Result, LAMPORTS_PER_SOL};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

// ============================================================================
// UniformRange
// ============================================================================

/// Closed sampling range `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UniformRange<T> {
    pub min: T,
    pub max: T,
}

/// Bound type a [`UniformRange`] can be sampled over.
pub trait RangeBound: PartialOrd + Display + Copy {
    /// Whether `[min, max]` can be handed to a uniform sampler.
    fn samplable(min: Self, max: Self) -> bool;
}

impl RangeBound for u64 {
    fn samplable(_min: Self, _max: Self) -> bool {
        true
    }
}

impl RangeBound for f64 {
    fn samplable(min: Self, max: Self) -> bool {
        min.is_finite() && max.is_finite() && (max - min).is_finite()
    }
}

impl<T> UniformRange<T> {
    pub fn new(min: T, max: T) -> Self {
        Self { min, max }
    }
}

impl<T: RangeBound> UniformRange<T> {
    /// Ensure `min <= max` and that both bounds can be sampled.
    pub fn validate(&self, field: &'static str) -> Result<()> {
        // NaN bounds fail this check.
        if !(self.min <= self.max) {
            return Err(CoreError::InvalidRange {
                field,
                min: self.min.to_string(),
                max: self.max.to_string(),
            });
        }
        if !T::samplable(self.min, self.max) {
            return Err(CoreError::InvalidConfig(format!(
                "{field} must have finite bounds, got [{}, {}]",
                self.min, self.max
            )));
        }
        Ok(())
    }

    pub fn contains(&self, value: T) -> bool {
        self.min <= value && value <= self.max
    }
}

// ============================================================================
// FleetConfig
// ============================================================================

/// Funding and collection parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetConfig {
    /// Number of wallets in the fleet. Default: 6.
    #[serde(default = "default_wallet_count")]
    pub wallet_count: usize,
    /// Per-wallet funding amount (lamports). Default: 0.005-0.025 SOL.
    #[serde(default = "default_funding_lamports")]
    pub funding_lamports: UniformRange<u64>,
    /// Lamports left behind in each wallet on collection. Default: 5000.
    #[serde(default = "default_reserve")]
    pub reserve: Lamports,
    /// Delay between consecutive funding transfers (ms). Default: 0-2000.
    #[serde(default = "default_transfer_delay_ms")]
    pub transfer_delay_ms: UniformRange<u64>,
}

fn default_wallet_count() -> usize {
    6
}

fn default_funding_lamports() -> UniformRange<u64> {
    UniformRange::new(5_000_000, 25_000_000)
}

fn default_reserve() -> Lamports {
    Lamports(5_000)
}

fn default_transfer_delay_ms() -> UniformRange<u64> {
    UniformRange::new(0, 2_000)
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            wallet_count: default_wallet_count(),
            funding_lamports: default_funding_lamports(),
            reserve: default_reserve(),
            transfer_delay_ms: default_transfer_delay_ms(),
        }
    }
}

impl FleetConfig {
    /// Validate before any funds move.
    pub fn validate(&self) -> Result<()> {
        if self.wallet_count == 0 {
            return Err(CoreError::InvalidConfig(
                "wallet_count must be at least 1".to_string(),
            ));
        }
        self.funding_lamports.validate("funding_lamports")?;
        self.transfer_delay_ms.validate("transfer_delay_ms")?;
        Ok(())
    }
}

// ============================================================================
// CycleConfig
// ============================================================================

/// How `total_cycles` relates to the fleet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleScope {
    /// Every wallet trades `cycles_per_wallet` times.
    #[default]
    Wallet,
    /// `total_cycles` units are spread round-robin over the fleet.
    Cycle,
}

/// Trade-cycle scheduler parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleConfig {
    /// Total units. Required for cycle scope, cross-checked for wallet scope.
    #[serde(default)]
    pub total_cycles: Option<usize>,
    /// Cycles per wallet. Default: 11.
    #[serde(default = "default_cycles_per_wallet")]
    pub cycles_per_wallet: usize,
    #[serde(default)]
    pub scope: CycleScope,
    /// Sleep between cycles (ms). Default: 10-20 s.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: UniformRange<u64>,
    /// Buy size (lamports). Default: 0.005-0.025 SOL.
    #[serde(default = "default_sol_amount_lamports")]
    pub sol_amount_lamports: UniformRange<u64>,
    /// Price-impact target as a fraction. Default: 0.1%-0.5%.
    #[serde(default = "default_price_bump")]
    pub price_bump: UniformRange<f64>,
    /// Sleep between a unit's buy and sell (ms). Default: 0-2000.
    #[serde(default = "default_bundle_delay_ms")]
    pub bundle_delay_ms: UniformRange<u64>,
    /// Front-loading window (minutes). 0 disables. Default: 5.
    #[serde(default = "default_front_load_window_minutes")]
    pub front_load_window_minutes: f64,
    /// Cumulative volume cap (lamports). `None` (or `0` in a file) means
    /// unbounded. Default: 1 SOL.
    #[serde(
        default = "default_max_volume",
        deserialize_with = "deserialize_max_volume"
    )]
    pub max_volume: Option<Lamports>,
    /// Check the volume cap every N trades. Default: 5.
    #[serde(default = "default_volume_check_every_n_trades")]
    pub volume_check_every_n_trades: u64,
    /// Silent pauses per run. Default: 2.
    #[serde(default = "default_pause_count")]
    pub pause_count: usize,
    /// Silent pause length (ms). Default: 2-3 minutes.
    #[serde(default = "default_pause_duration_ms")]
    pub pause_duration_ms: UniformRange<u64>,
}

fn default_cycles_per_wallet() -> usize {
    11
}

fn default_interval_ms() -> UniformRange<u64> {
    UniformRange::new(10_000, 20_000)
}

fn default_sol_amount_lamports() -> UniformRange<u64> {
    UniformRange::new(5_000_000, 25_000_000)
}

fn default_price_bump() -> UniformRange<f64> {
    UniformRange::new(0.001, 0.005)
}

fn default_bundle_delay_ms() -> UniformRange<u64> {
    UniformRange::new(0, 2_000)
}

fn default_front_load_window_minutes() -> f64 {
    5.0
}

fn default_max_volume() -> Option<Lamports> {
    Some(Lamports(LAMPORTS_PER_SOL))
}

fn deserialize_max_volume<'de, D>(deserializer: D) -> std::result::Result<Option<Lamports>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<u64> = Option::deserialize(deserializer)?;
    Ok(raw.filter(|v| *v > 0).map(Lamports))
}

fn default_volume_check_every_n_trades() -> u64 {
    5
}

fn default_pause_count() -> usize {
    2
}

fn default_pause_duration_ms() -> UniformRange<u64> {
    UniformRange::new(120_000, 180_000)
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            total_cycles: None,
            cycles_per_wallet: default_cycles_per_wallet(),
            scope: CycleScope::default(),
            interval_ms: default_interval_ms(),
            sol_amount_lamports: default_sol_amount_lamports(),
            price_bump: default_price_bump(),
            bundle_delay_ms: default_bundle_delay_ms(),
            front_load_window_minutes: default_front_load_window_minutes(),
            max_volume: default_max_volume(),
            volume_check_every_n_trades: default_volume_check_every_n_trades(),
            pause_count: default_pause_count(),
            pause_duration_ms: default_pause_duration_ms(),
        }
    }
}

impl CycleConfig {
    /// Number of (cycle, wallet) units in a run over `wallet_count` wallets.
    ///
    /// Saturates when `cycles_per_wallet x wallet_count` overflows; `validate`
    /// rejects such a configuration.
    pub fn total_units(&self, wallet_count: usize) -> usize {
        match self.scope {
            CycleScope::Wallet => self.wallet_scope_units(wallet_count).unwrap_or(usize::MAX),
            CycleScope::Cycle => self.total_cycles.unwrap_or(0),
        }
    }

    fn wallet_scope_units(&self, wallet_count: usize) -> Option<usize> {
        self.cycles_per_wallet.checked_mul(wallet_count)
    }

    /// Validate against the fleet size before a run starts.
    pub fn validate(&self, wallet_count: usize) -> Result<()> {
        if wallet_count == 0 {
            return Err(CoreError::InvalidConfig(
                "fleet has no wallets".to_string(),
            ));
        }
        self.interval_ms.validate("interval_ms")?;
        self.sol_amount_lamports.validate("sol_amount_lamports")?;
        self.price_bump.validate("price_bump")?;
        self.bundle_delay_ms.validate("bundle_delay_ms")?;
        self.pause_duration_ms.validate("pause_duration_ms")?;

        if self.volume_check_every_n_trades == 0 {
            return Err(CoreError::InvalidConfig(
                "volume_check_every_n_trades must be at least 1".to_string(),
            ));
        }
        if !self.front_load_window_minutes.is_finite() || self.front_load_window_minutes < 0.0 {
            return Err(CoreError::InvalidConfig(format!(
                "front_load_window_minutes must be a non-negative number, got {}",
                self.front_load_window_minutes
            )));
        }

        match self.scope {
            CycleScope::Wallet => {
                let expected = self.wallet_scope_units(wallet_count).ok_or_else(|| {
                    CoreError::InvalidConfig(format!(
                        "cycles_per_wallet {} x wallets {wallet_count} overflows",
                        self.cycles_per_wallet
                    ))
                })?;
                if let Some(total) = self.total_cycles {
                    if total != expected {
                        return Err(CoreError::InvalidConfig(format!(
                            "total_cycles {total} != cycles_per_wallet {} x wallets {wallet_count}",
                            self.cycles_per_wallet
                        )));
                    }
                }
            }
            CycleScope::Cycle => {
                if self.total_cycles.is_none() {
                    return Err(CoreError::MissingField("total_cycles"));
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// LegacyBotConfig
// ============================================================================

/// The older `bot.json` layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyBotConfig {
    pub wallets_file: String,
    pub cycle_count: usize,
    #[serde(rename = "minCycleSizeSOL")]
    pub min_cycle_size_sol: Decimal,
    #[serde(rename = "maxCycleSizeSOL")]
    pub max_cycle_size_sol: Decimal,
    pub min_interval_sec: Decimal,
    pub max_interval_sec: Decimal,
    pub price_bump_min_pct: Decimal,
    pub price_bump_max_pct: Decimal,
}

impl LegacyBotConfig {
    /// Parse from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Convert into a `CycleConfig`, keeping defaults for fields the legacy
    /// layout does not carry.
    pub fn into_cycle_config(self) -> Result<CycleConfig> {
        let price_bump = UniformRange::new(
            pct_to_fraction(self.price_bump_min_pct, "priceBumpMinPct")?,
            pct_to_fraction(self.price_bump_max_pct, "priceBumpMaxPct")?,
        );
        let config = CycleConfig {
            cycles_per_wallet: self.cycle_count,
            sol_amount_lamports: UniformRange::new(
                Lamports::from_sol(self.min_cycle_size_sol)?.inner(),
                Lamports::from_sol(self.max_cycle_size_sol)?.inner(),
            ),
            interval_ms: UniformRange::new(
                secs_to_ms(self.min_interval_sec, "minIntervalSec")?,
                secs_to_ms(self.max_interval_sec, "maxIntervalSec")?,
            ),
            price_bump,
            ..CycleConfig::default()
        };
        config.sol_amount_lamports.validate("minCycleSizeSOL..maxCycleSizeSOL")?;
        config.interval_ms.validate("minIntervalSec..maxIntervalSec")?;
        config.price_bump.validate("priceBumpMinPct..priceBumpMaxPct")?;
        Ok(config)
    }
}

fn secs_to_ms(secs: Decimal, field: &'static str) -> Result<u64> {
    (secs * Decimal::from(1000))
        .round()
        .to_u64()
        .ok_or_else(|| CoreError::InvalidConfig(format!("{field} out of range: {secs}")))
}

fn pct_to_fraction(pct: Decimal, field: &'static str) -> Result<f64> {
    (pct / Decimal::from(100))
        .to_f64()
        .ok_or_else(|| CoreError::InvalidConfig(format!("{field} out of range: {pct}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_cycle_defaults() {
        let config = CycleConfig::default();
        assert_eq!(config.cycles_per_wallet, 11);
        assert_eq!(config.total_units(6), 66);
        assert_eq!(config.max_volume, Some(Lamports(LAMPORTS_PER_SOL)));
        assert_eq!(config.pause_count, 2);
        assert!(config.validate(6).is_ok());
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let config = CycleConfig {
            interval_ms: UniformRange::new(20_000, 10_000),
            ..CycleConfig::default()
        };
        let err = config.validate(6).unwrap_err();
        assert!(matches!(err, CoreError::InvalidRange { field: "interval_ms", .. }));
    }

    #[test]
    fn test_validate_rejects_nan_bump() {
        let config = CycleConfig {
            price_bump: UniformRange::new(f64::NAN, 0.1),
            ..CycleConfig::default()
        };
        assert!(config.validate(6).is_err());
    }

    #[test]
    fn test_validate_rejects_infinite_bump() {
        let config: CycleConfig = toml::from_str("price_bump = { min = 0.0, max = inf }").unwrap();
        assert!(config.price_bump.max.is_infinite());
        assert!(matches!(config.validate(6), Err(CoreError::InvalidConfig(_))));

        let config = CycleConfig {
            price_bump: UniformRange::new(-f64::MAX, f64::MAX),
            ..CycleConfig::default()
        };
        assert!(config.validate(6).is_err());
    }

    #[test]
    fn test_validate_rejects_unit_count_overflow() {
        let config = CycleConfig {
            cycles_per_wallet: usize::MAX / 2,
            ..CycleConfig::default()
        };
        assert!(matches!(config.validate(6), Err(CoreError::InvalidConfig(_))));
        assert_eq!(config.total_units(6), usize::MAX);
    }

    #[test]
    fn test_validate_wallet_scope_invariant() {
        let mut config = CycleConfig {
            total_cycles: Some(66),
            ..CycleConfig::default()
        };
        assert!(config.validate(6).is_ok());
        config.total_cycles = Some(60);
        assert!(config.validate(6).is_err());
    }

    #[test]
    fn test_validate_cycle_scope_needs_total() {
        let mut config = CycleConfig {
            scope: CycleScope::Cycle,
            ..CycleConfig::default()
        };
        assert!(matches!(
            config.validate(6),
            Err(CoreError::MissingField("total_cycles"))
        ));
        config.total_cycles = Some(10);
        assert!(config.validate(6).is_ok());
        assert_eq!(config.total_units(6), 10);
    }

    #[test]
    fn test_validate_zero_check_interval_and_empty_fleet() {
        let config = CycleConfig {
            volume_check_every_n_trades: 0,
            ..CycleConfig::default()
        };
        assert!(config.validate(6).is_err());
        assert!(CycleConfig::default().validate(0).is_err());
    }

    #[test]
    fn test_zero_max_volume_means_unbounded() {
        let config: CycleConfig = serde_json::from_str(r#"{"max_volume": 0}"#).unwrap();
        assert_eq!(config.max_volume, None);
        let config: CycleConfig = serde_json::from_str(r#"{"max_volume": 42}"#).unwrap();
        assert_eq!(config.max_volume, Some(Lamports(42)));
        let config: CycleConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.max_volume, Some(Lamports(LAMPORTS_PER_SOL)));
    }

    #[test]
    fn test_fleet_config_validate() {
        assert!(FleetConfig::default().validate().is_ok());
        let config = FleetConfig {
            wallet_count: 0,
            ..FleetConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_legacy_bot_json() {
        let json = r#"{
            "walletsFile": "bundler-wallets.json",
            "cycleCount": 11,
            "minCycleSizeSOL": 0.005,
            "maxCycleSizeSOL": 0.025,
            "minIntervalSec": 10,
            "maxIntervalSec": 20.5,
            "priceBumpMinPct": 0.1,
            "priceBumpMaxPct": 0.5
        }"#;
        let legacy = LegacyBotConfig::from_json(json).unwrap();
        assert_eq!(legacy.wallets_file, "bundler-wallets.json");
        assert_eq!(legacy.min_cycle_size_sol, dec!(0.005));

        let config = legacy.into_cycle_config().unwrap();
        assert_eq!(config.cycles_per_wallet, 11);
        assert_eq!(config.sol_amount_lamports, UniformRange::new(5_000_000, 25_000_000));
        assert_eq!(config.interval_ms, UniformRange::new(10_000, 20_500));
        assert!((config.price_bump.min - 0.001).abs() < 1e-12);
        assert!((config.price_bump.max - 0.005).abs() < 1e-12);
    }

    #[test]
    fn test_legacy_bot_json_inverted_sizes() {
        let legacy = LegacyBotConfig {
            wallets_file: "w.json".to_string(),
            cycle_count: 1,
            min_cycle_size_sol: dec!(0.5),
            max_cycle_size_sol: dec!(0.1),
            min_interval_sec: dec!(1),
            max_interval_sec: dec!(2),
            price_bump_min_pct: dec!(0.1),
            price_bump_max_pct: dec!(0.2),
        };
        assert!(legacy.into_cycle_config().is_err());
    }

    #[test]
    fn test_legacy_bot_json_missing_field() {
        let json = r#"{"walletsFile": "w.json", "cycleCount": 3}"#;
        assert!(matches!(
            LegacyBotConfig::from_json(json),
            Err(CoreError::Json(_))
        ));
    }
}
