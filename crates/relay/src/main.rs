//! Relay - the ingest daemon
//!
//! Loads configuration, composes an engine with the built-in plug-ins, and
//! runs until a shutdown signal arrives.
//!
//! ```bash
//! relay --config configs/example.json
//! RELAY_CONFIG=/etc/relay/config.json relay
//! ```

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use relay_config::Config;
use relay_engine::{Engine, PluginRegistries};

/// Generalized message-ingest daemon
#[derive(Parser, Debug)]
#[command(name = "relay")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, env = "RELAY_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let path = Config::resolve_path(cli.config);
    tracing::info!(config = %path.display(), "loading configuration");
    let config = Config::from_file(&path)?;

    let engine = Engine::new(config, PluginRegistries::builtin());

    if !engine.initialize().await {
        bail!("engine failed to initialize");
    }
    if !engine.start().await {
        bail!("engine failed to start");
    }
    tracing::info!(
        deployment = engine.deployment_name(),
        "relay running, ctrl-c to stop"
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown requested");

    if !engine.stop().await {
        bail!("engine did not stop cleanly");
    }
    Ok(())
}

/// Install the tracing subscriber
fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {e}"))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();
    Ok(())
}
