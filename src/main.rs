//! CLI entry point for hvac_daq
//!
//! Provides command-line interface for:
//! - Running the telemetry daemon (poller + scheduled jobs)
//! - One-shot maintenance: rotate, retention, index rebuild
//! - Configuration checks
//!
//! # Usage
//!
//! ```bash
//! hvac_daq run --config config/hvac_daq.toml --simulate
//! hvac_daq index --table-only
//! ```

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use hvac_daq::daemon::{open_active_log, Daemon};
use hvac_daq::data::index::write_index;
use hvac_daq::data::ArtifactLayout;
use hvac_daq::hardware::{HvacDevice, MockDevice};
use hvac_daq::jobs::{RetentionJob, RotationJob};
use hvac_daq::scheduler::Job;
use hvac_daq::{logging, HvacConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

#[derive(Parser)]
#[command(name = "hvac_daq")]
#[command(about = "HVAC telemetry cache with daily log rotation and charts", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = "config/hvac_daq.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the daemon until Ctrl-C
    Run {
        /// Use the built-in simulated thermostat
        #[arg(long)]
        simulate: bool,
    },

    /// Archive the active log and chart it now
    Rotate,

    /// Expire old archives and charts, then rebuild the index
    Retention,

    /// Rebuild the chart index
    Index {
        /// Write only the <table> fragment
        #[arg(long)]
        table_only: bool,
    },

    /// Load and validate the configuration, then print it
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = HvacConfig::load_from(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    config.validate()?;
    logging::init_from_config(&config).map_err(anyhow::Error::msg)?;

    match cli.command {
        Commands::Run { simulate } => run(config, simulate).await,
        Commands::Rotate => {
            let log = open_active_log(&config)?;
            let layout = ArtifactLayout::from_config(&config.storage);
            let outcome = RotationJob::new(log, layout).run(Local::now())?;
            info!(%outcome, "rotation");
            Ok(())
        }
        Commands::Retention => {
            let layout = ArtifactLayout::from_config(&config.storage);
            let outcome = RetentionJob::new(layout, config.storage.retention_days).run(Local::now())?;
            info!(%outcome, "retention");
            Ok(())
        }
        Commands::Index { table_only } => {
            let layout = ArtifactLayout::from_config(&config.storage);
            let charts = write_index(&layout, table_only, Local::now())?;
            info!(charts, path = %layout.index_path().display(), "index written");
            Ok(())
        }
        Commands::CheckConfig => {
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

async fn run(config: HvacConfig, simulate: bool) -> Result<()> {
    if !simulate {
        anyhow::bail!(
            "no transport driver for '{}' is built in; use --simulate or provide an HvacDevice implementation",
            config.device.transport
        );
    }

    let mock = Arc::new(MockDevice::new());
    let (sim_tx, sim_rx) = watch::channel(false);
    let simulation = Arc::clone(&mock).spawn_simulation(config.poll_interval(), sim_rx);

    let device: Arc<dyn HvacDevice> = mock;
    let result = Daemon::new(config, device).run().await;

    let _ = sim_tx.send(true);
    let _ = simulation.await;
    Ok(result?)
}
