//! vbot - Entry Point

use anyhow::Result;
use clap::Parser;
use tracing::info;
use vbot_bot::config::{DEFAULT_CONFIG_PATH, ENV_CONFIG};
use vbot_core::LegacyBotConfig;

/// Fleet volume bot
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via VBOT_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Use the simulated ledger and market
    #[arg(long)]
    dry_run: bool,

    /// Load cycle settings and the wallets file from a legacy bot.json
    #[arg(long)]
    legacy_bot_json: Option<String>,

    /// Seed for reproducible randomization
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    vbot_telemetry::init_logging()?;

    info!("Starting vbot v{}", env!("CARGO_PKG_VERSION"));

    // CLI arg > VBOT_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var(ENV_CONFIG).ok())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    info!(config_path = %config_path, "Loading configuration");
    let mut config = vbot_bot::AppConfig::load(&config_path)?;
    config.apply_env();

    if let Some(path) = args.legacy_bot_json {
        let legacy = LegacyBotConfig::from_json(&std::fs::read_to_string(&path)?)?;
        config.apply_legacy(legacy)?;
        info!(path = %path, "Legacy cycle settings applied");
    }
    if args.dry_run {
        config.dry_run = true;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    info!(?config, "Configuration loaded");

    let app = vbot_bot::Application::new(config)?;
    let report = app.run().await?;

    info!(
        funded = report.distribution.succeeded,
        state = %report.summary.state,
        collected = ?report.collection.map(|c| c.total_collected.to_string()),
        "vbot finished"
    );

    Ok(())
}
