//! Application configuration.

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use vbot_core::{CycleConfig, FleetConfig, Lamports, LegacyBotConfig};
use vbot_executor::{BurstMode, DEFAULT_RELAY_TIMEOUT, DEFAULT_RELAY_URL};
use zeroize::Zeroize;

/// Funding keypair, base58.
pub const ENV_FUNDING_KEY: &str = "VBOT_FUNDING_KEY";
/// Ledger RPC endpoint.
pub const ENV_RPC_URL: &str = "VBOT_RPC_URL";
/// Bundle relay endpoint.
pub const ENV_RELAY_URL: &str = "VBOT_RELAY_URL";
/// Config file path when `--config` is not given.
pub const ENV_CONFIG: &str = "VBOT_CONFIG";

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

// ============================================================================
// Sections
// ============================================================================

/// Ledger RPC connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    /// RPC endpoint URL. Default: Solana mainnet-beta.
    #[serde(default = "default_rpc_url")]
    pub url: String,
    /// Request timeout (ms). Default: 30,000.
    #[serde(default = "default_rpc_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_rpc_url() -> String {
    "https://api.mainnet-beta.solana.com".to_string()
}

fn default_rpc_timeout_ms() -> u64 {
    30_000
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: default_rpc_url(),
            timeout_ms: default_rpc_timeout_ms(),
        }
    }
}

impl RpcConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Initial concurrent purchase before the steady-state run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BurstSettings {
    /// Run a burst after funding. Default: false.
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub mode: BurstMode,
    /// Purchases in flight at once. Default: one per wallet.
    #[serde(default)]
    pub max_concurrency: Option<usize>,
    /// Tip account (base58). Required for live bundle mode.
    #[serde(default)]
    pub tip_account: Option<String>,
    /// Tip in lamports. Default: 1,000,000 (0.001 SOL).
    #[serde(default = "default_tip_amount")]
    pub tip_amount: Lamports,
    #[serde(default = "default_relay_url")]
    pub relay_url: String,
    /// Relay request timeout (ms). Default: 30,000.
    #[serde(default = "default_relay_timeout_ms")]
    pub relay_timeout_ms: u64,
}

fn default_tip_amount() -> Lamports {
    Lamports(1_000_000)
}

fn default_relay_url() -> String {
    DEFAULT_RELAY_URL.to_string()
}

fn default_relay_timeout_ms() -> u64 {
    DEFAULT_RELAY_TIMEOUT.as_millis() as u64
}

impl Default for BurstSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: BurstMode::default(),
            max_concurrency: None,
            tip_account: None,
            tip_amount: default_tip_amount(),
            relay_url: default_relay_url(),
            relay_timeout_ms: default_relay_timeout_ms(),
        }
    }
}

impl BurstSettings {
    pub fn relay_timeout(&self) -> Duration {
        Duration::from_millis(self.relay_timeout_ms)
    }

    /// Parsed tip account, if one is configured.
    pub fn tip_account(&self) -> AppResult<Option<Pubkey>> {
        self.tip_account
            .as_deref()
            .map(|s| {
                Pubkey::from_str(s)
                    .map_err(|e| AppError::Config(format!("Invalid tip_account {s}: {e}")))
            })
            .transpose()
    }
}

// ============================================================================
// AppConfig
// ============================================================================

/// Top-level configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Simulated ledger and market. Default: true.
    #[serde(default = "default_dry_run")]
    pub dry_run: bool,
    /// Wallet-set JSON file. Generated on first run.
    #[serde(default = "default_wallets_file")]
    pub wallets_file: String,
    /// Return funds to the funding wallet after the run. Default: true.
    #[serde(default = "default_collect_on_finish")]
    pub collect_on_finish: bool,
    /// Seed for reproducible runs.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Funding keypair (base58). Prefer `VBOT_FUNDING_KEY`.
    #[serde(default, skip_serializing)]
    pub funding_key: Option<String>,
    #[serde(default)]
    pub rpc: RpcConfig,
    #[serde(default)]
    pub fleet: FleetConfig,
    #[serde(default)]
    pub cycle: CycleConfig,
    #[serde(default)]
    pub burst: BurstSettings,
}

fn default_dry_run() -> bool {
    true
}

fn default_wallets_file() -> String {
    "data/wallets.json".to_string()
}

fn default_collect_on_finish() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dry_run: default_dry_run(),
            wallets_file: default_wallets_file(),
            collect_on_finish: default_collect_on_finish(),
            seed: None,
            funding_key: None,
            rpc: RpcConfig::default(),
            fleet: FleetConfig::default(),
            cycle: CycleConfig::default(),
            burst: BurstSettings::default(),
        }
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("dry_run", &self.dry_run)
            .field("wallets_file", &self.wallets_file)
            .field("collect_on_finish", &self.collect_on_finish)
            .field("seed", &self.seed)
            .field("funding_key", &self.funding_key.as_ref().map(|_| "<redacted>"))
            .field("rpc", &self.rpc)
            .field("fleet", &self.fleet)
            .field("cycle", &self.cycle)
            .field("burst", &self.burst)
            .finish()
    }
}

impl AppConfig {
    /// Load from a specific file.
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Load from `path`, falling back to defaults when the file is missing.
    pub fn load(path: &str) -> AppResult<Self> {
        if Path::new(path).exists() {
            Self::from_file(path)
        } else {
            tracing::warn!(path = %path, "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Apply secrets from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply secrets from `lookup`. Set values replace the file's.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup(ENV_FUNDING_KEY) {
            self.funding_key = Some(key);
        }
        if let Some(url) = lookup(ENV_RPC_URL) {
            self.rpc.url = url;
        }
        if let Some(url) = lookup(ENV_RELAY_URL) {
            self.burst.relay_url = url;
        }
    }

    /// Replace the cycle section and wallets file with a legacy `bot.json`.
    pub fn apply_legacy(&mut self, legacy: LegacyBotConfig) -> AppResult<()> {
        let wallets_file = legacy.wallets_file.clone();
        self.cycle = legacy.into_cycle_config()?;
        if !wallets_file.is_empty() {
            self.wallets_file = wallets_file;
        }
        Ok(())
    }

    /// Check everything that must hold before any funds move.
    pub fn validate(&self) -> AppResult<()> {
        self.fleet.validate()?;
        self.cycle.validate(self.fleet.wallet_count)?;
        let tip_account = self.burst.tip_account()?;

        if self.dry_run {
            return Ok(());
        }
        if self.funding_key.is_none() {
            return Err(AppError::Config(format!(
                "{ENV_FUNDING_KEY} is required outside dry-run mode"
            )));
        }
        if self.burst.enabled && self.burst.mode == BurstMode::Bundle && tip_account.is_none() {
            return Err(AppError::Config(
                "burst.tip_account is required for bundle mode".to_string(),
            ));
        }
        Ok(())
    }

    /// Decode the configured funding keypair.
    pub fn funding_keypair(&self) -> AppResult<Option<Keypair>> {
        let Some(encoded) = self.funding_key.as_deref() else {
            return Ok(None);
        };
        let mut bytes = bs58::decode(encoded)
            .into_vec()
            .map_err(|e| AppError::Config(format!("Invalid {ENV_FUNDING_KEY}: {e}")))?;
        let keypair = Keypair::try_from(&bytes[..])
            .map_err(|e| AppError::Config(format!("Invalid {ENV_FUNDING_KEY}: {e}")));
        bytes.zeroize();
        keypair.map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::signer::Signer;
    use vbot_core::CycleScope;

    #[test]
    fn test_defaults_from_empty_file() {
        let config = AppConfig::from_toml("").unwrap();
        assert!(config.dry_run);
        assert_eq!(config.fleet.wallet_count, 6);
        assert_eq!(config.cycle.cycles_per_wallet, 11);
        assert_eq!(config.burst.tip_amount, Lamports(1_000_000));
        assert_eq!(config.burst.relay_timeout(), Duration::from_secs(30));
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_sections() {
        let toml = r#"
            dry_run = false
            wallets_file = "/tmp/w.json"
            seed = 7

            [rpc]
            url = "http://localhost:8899"

            [fleet]
            wallet_count = 3
            reserve = 10000

            [cycle]
            cycles_per_wallet = 4
            max_volume = 0
            interval_ms = { min = 1000, max = 2000 }

            [burst]
            enabled = true
            mode = "bundle"
            max_concurrency = 2
            tip_account = "11111111111111111111111111111111"
        "#;
        let config = AppConfig::from_toml(toml).unwrap();
        assert!(!config.dry_run);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.rpc.url, "http://localhost:8899");
        assert_eq!(config.fleet.reserve, Lamports(10_000));
        assert_eq!(config.cycle.scope, CycleScope::Wallet);
        assert_eq!(config.cycle.max_volume, None);
        assert_eq!(config.cycle.interval_ms.max, 2_000);
        assert_eq!(config.burst.mode, BurstMode::Bundle);
        assert_eq!(config.burst.tip_account().unwrap(), Some(Pubkey::default()));
    }

    #[test]
    fn test_live_mode_requires_funding_key() {
        let mut config = AppConfig {
            dry_run: false,
            ..AppConfig::default()
        };
        assert!(matches!(config.validate(), Err(AppError::Config(_))));

        let key = Keypair::new();
        config.apply_env_from(|k| {
            (k == ENV_FUNDING_KEY).then(|| bs58::encode(key.to_bytes()).into_string())
        });
        config.validate().unwrap();
        assert_eq!(
            config.funding_keypair().unwrap().unwrap().pubkey(),
            key.pubkey()
        );
    }

    #[test]
    fn test_live_bundle_mode_requires_tip_account() {
        let mut config = AppConfig {
            dry_run: false,
            funding_key: Some(bs58::encode(Keypair::new().to_bytes()).into_string()),
            ..AppConfig::default()
        };
        config.burst.enabled = true;
        config.burst.mode = BurstMode::Bundle;
        assert!(config.validate().is_err());

        config.burst.tip_account = Some(Pubkey::new_unique().to_string());
        config.validate().unwrap();
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config.apply_env_from(|k| match k {
            ENV_RPC_URL => Some("http://rpc".to_string()),
            ENV_RELAY_URL => Some("http://relay".to_string()),
            _ => None,
        });
        assert_eq!(config.rpc.url, "http://rpc");
        assert_eq!(config.burst.relay_url, "http://relay");
        assert!(config.funding_key.is_none());
    }

    #[test]
    fn test_invalid_funding_key() {
        let config = AppConfig {
            funding_key: Some("not-base58-0OIl".to_string()),
            ..AppConfig::default()
        };
        assert!(config.funding_keypair().is_err());
    }

    #[test]
    fn test_debug_redacts_funding_key() {
        let config = AppConfig {
            funding_key: Some("secret-material".to_string()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret-material"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_apply_legacy() {
        let legacy = LegacyBotConfig::from_json(
            r#"{
                "walletsFile": "legacy-wallets.json",
                "cycleCount": 3,
                "minCycleSizeSOL": 0.01,
                "maxCycleSizeSOL": 0.02,
                "minIntervalSec": 5,
                "maxIntervalSec": 10,
                "priceBumpMinPct": 0.1,
                "priceBumpMaxPct": 0.5
            }"#,
        )
        .unwrap();
        let mut config = AppConfig::default();
        config.apply_legacy(legacy).unwrap();
        assert_eq!(config.wallets_file, "legacy-wallets.json");
        assert_eq!(config.cycle.cycles_per_wallet, 3);
        assert_eq!(config.cycle.sol_amount_lamports.min, 10_000_000);
        assert_eq!(config.cycle.interval_ms.max, 10_000);
    }
}
