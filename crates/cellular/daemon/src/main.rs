//! Cellular Daemon - hosts a cellular manager
//!
//! Loads configuration, initialises tracing, builds a demo topology (a ring
//! of relay cells grouped into one tissue and one organ), starts the manager
//! and runs until interrupted.

use anyhow::Context;
use cellular_runtime::{CellularManager, ManagerConfig};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod demo;

/// Cellular Daemon CLI
#[derive(Parser)]
#[command(name = "cellulard")]
#[command(about = "Cellular Daemon - hierarchical component runtime host", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "CELLULAR_CONFIG")]
    config: Option<String>,

    /// Log level
    #[arg(long, env = "CELLULAR_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Enable JSON logging
    #[arg(long, env = "CELLULAR_LOG_JSON")]
    json: bool,

    /// Number of cells in the demo ring
    #[arg(long, default_value_t = 4)]
    cells: usize,

    /// Print one health report and exit instead of waiting for ctrl-c
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| cli.log_level.clone().into());

    if cli.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let config = ManagerConfig::load(cli.config.as_deref()).context("loading configuration")?;
    tracing::info!(
        monitor_interval_secs = config.monitor.interval_secs,
        cells = cli.cells,
        "Starting cellular daemon"
    );

    let manager = CellularManager::new(config);
    demo::build(&manager, cli.cells)?;

    let report = manager.initialize().await?;
    for (component, error) in &report.failed {
        tracing::warn!(component = %component, error = %error, "Component did not start");
    }

    let results = demo::exercise(&manager).await;
    tracing::info!(responses = results, "Demo traffic dispatched");

    let health = manager.check_health_now();
    println!("{}", serde_json::to_string_pretty(&health)?);

    if !cli.once {
        tokio::signal::ctrl_c()
            .await
            .context("waiting for shutdown signal")?;
        tracing::info!("Shutdown signal received");
    }

    manager.shutdown().await?;
    Ok(())
}
