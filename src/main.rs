use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use seatwatch::config::Config;

mod commands;

#[derive(Parser)]
#[command(
    name = "seatwatch",
    version,
    about = "Cinema seat-occupancy tracker with scored proxy rotation",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML); environment variables are used otherwise
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Concurrent workers per stage
    #[arg(short, long, global = true)]
    workers: Option<usize>,

    /// Delay between seat-stage jobs in milliseconds
    #[arg(short, long, global = true)]
    delay: Option<u64>,

    /// Connect directly instead of through the proxy pool
    #[arg(long, global = true)]
    no_proxy: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); overrides the configured format
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every showing with seat counts and write them to a JSON file
    Fetch {
        /// Output directory
        #[arg(short, long, default_value = "files")]
        output: PathBuf,
    },

    /// Re-check seats of every session running today
    Today,

    /// Create the PostgreSQL seat log table
    InitDb,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    if let Some(workers) = cli.workers {
        config.crawler.workers = workers;
    }
    if let Some(delay) = cli.delay {
        config.crawler.request_delay_ms = delay;
    }
    config.validate().context("Invalid configuration")?;

    // Initialize tracing/logging
    let log_format = cli
        .log_format
        .clone()
        .unwrap_or_else(|| config.logging.format.clone());
    setup_tracing(&log_format, &config.logging.level, cli.verbose)?;

    tracing::info!(
        workers = config.crawler.workers,
        delay_ms = config.crawler.request_delay_ms,
        no_proxy = cli.no_proxy,
        "seatwatch starting"
    );

    match cli.command {
        Commands::Fetch { output } => {
            tracing::info!(output = %output.display(), "Starting fetch command");
            commands::fetch(config, cli.no_proxy, output).await?;
        }

        Commands::Today => {
            tracing::info!("Starting today command");
            commands::today(config, cli.no_proxy).await?;
        }

        Commands::InitDb => {
            tracing::info!("Starting init-db command");
            commands::init_db(config).await?;
        }
    }

    tracing::info!("seatwatch completed successfully");
    Ok(())
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("seatwatch=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::new(format!("seatwatch={level},warn"))
        })
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}
