//! Sentinel daemon binary
//!
//! Serves readiness and liveness endpoints backed by the configured probes.

use clap::Parser;
use daemon::bootstrap::bootstrap;
use schema::SentinelConfig;
use sentinel_core::config::{load_config_from_toml_path, validate_config};
use sentinel_core::utils::init_tracing;
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "sentinel")]
#[command(about = "Readiness and liveness endpoints backed by pluggable health probes")]
#[command(version)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, short, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Host to bind, overriding the configuration file
    #[arg(long)]
    host: Option<String>,

    /// Port to bind, overriding the configuration file
    #[arg(long)]
    port: Option<u16>,

    /// Log level, overriding the configuration file (RUST_LOG wins over both)
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn load_config(&self) -> anyhow::Result<SentinelConfig> {
        let mut config = match &self.config {
            Some(path) => load_config_from_toml_path(path)?,
            None => SentinelConfig::default(),
        };
        if let Some(host) = &self.host {
            config.daemon.host = host.clone();
        }
        if let Some(port) = self.port {
            config.daemon.port = port;
        }
        if let Some(level) = &self.log_level {
            config.daemon.log_level = level.clone();
        }
        validate_config(&config)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config()?;

    init_tracing(&config.daemon.log_level)?;
    info!("Starting Sentinel daemon");

    let handle = bootstrap(&config).await?;
    info!("Listening on http://{}", handle.local_addr());

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
    } else {
        info!("Received Ctrl+C, shutting down...");
    }

    handle.shutdown().await?;
    info!("Daemon stopped");
    Ok(())
}
