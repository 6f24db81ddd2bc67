//! # SheetWatch
//!
//! Polls one spreadsheet cell and sends a push notification when it reports
//! a departure. Serves a small control panel over HTTP.
//!
//! Usage:
//!   sheetwatch                          # config.toml in the working directory
//!   sheetwatch --config /etc/sw.toml    # explicit config file
//!   sheetwatch --port 8080 --autostart  # custom port, begin polling at once

use anyhow::Result;
use clap::Parser;
use sheetwatch_core::SheetWatchConfig;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

const LOG_DIR: &str = "logs";
const LOG_FILE: &str = "app.log";

#[derive(Parser)]
#[command(
    name = "sheetwatch",
    version,
    about = "🚌 SheetWatch: spreadsheet cell monitor with push alerts"
)]
struct Cli {
    /// Config file (default: $SHEETWATCH_CONFIG or ./config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address for the control panel
    #[arg(long)]
    host: Option<String>,

    /// Control panel port
    #[arg(short, long)]
    port: Option<u16>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Log to stdout only
    #[arg(long)]
    no_log_file: bool,

    /// Start polling as soon as the server is up
    #[arg(long)]
    autostart: bool,
}

fn init_logging(verbose: bool, log_to_file: bool) -> Result<()> {
    let filter = if verbose {
        "sheetwatch=debug,tower_http=debug"
    } else {
        "sheetwatch=info,tower_http=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    let file_layer = if log_to_file {
        std::fs::create_dir_all(LOG_DIR)?;
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(PathBuf::from(LOG_DIR).join(LOG_FILE))?;
        Some(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(file_layer)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, !cli.no_log_file)?;

    let config_path = cli.config.clone().unwrap_or_else(SheetWatchConfig::default_path);
    let mut config = SheetWatchConfig::load(&config_path)?;
    if let Some(host) = cli.host {
        config.gateway.host = host;
    }
    if let Some(port) = cli.port {
        config.gateway.port = port;
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Invalid configuration: {e}");
        return Err(e.into());
    }

    tracing::info!("🚌 SheetWatch v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("   📄 Spreadsheet: {}", config.spreadsheet_id);
    tracing::info!("   🔲 Range:       {}", config.range_name);
    tracing::info!("   ⏱️  Interval:    {}s", config.polling_interval);
    match config.topic() {
        Some(topic) => tracing::info!("   🔔 ntfy topic:  {topic}"),
        None => tracing::info!("   🔔 ntfy topic:  (none, logging notifications only)"),
    }

    let scheduler = Arc::new(sheetwatch_scheduler::build_service(&config)?);

    if cli.autostart {
        tracing::info!("Autostart requested");
        scheduler.start().await;
    }

    sheetwatch_gateway::start(&config.gateway, scheduler).await
}
