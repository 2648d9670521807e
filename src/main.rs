// src/main.rs - Virtual DS1621 daemon
use clap::Parser;
use ds1621_sim::config::{self, Config};
use ds1621_sim::server;
use std::path::PathBuf;

/// Emulates DS1621 thermometers on a virtual I2C bus and exposes their
/// attributes over HTTP.
#[derive(Parser, Debug)]
#[command(name = "ds1621-sim", version)]
struct Cli {
    /// Path to a TOML config file (defaults are used when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overrides `server.bind`
    #[arg(short, long)]
    bind: Option<String>,

    /// Log level, overrides `logging.level`
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => Config::default(),
    };
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(config.logging.max_level()?)
        .init();

    tracing::info!("Starting DS1621 simulator");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));
    if let Some(path) = &cli.config {
        tracing::info!("Configuration loaded from: {}", path.display());
    }

    if let Err(e) = server::serve(config).await {
        tracing::error!("Simulator stopped: {}", e);
        return Err(Box::new(e) as Box<dyn std::error::Error + Send + Sync + 'static>);
    }
    Ok(())
}
