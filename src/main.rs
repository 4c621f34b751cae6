//! linkwatch: watch link-list pages and report new entries

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use linkwatch::config::{Config, LogFormat, LoggingConfig};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "linkwatch")]
#[command(about = "Watch link-list pages and report new entries")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "linkwatch.toml")]
    config: PathBuf,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a cycle every scraping.interval_secs until interrupted
    Run,

    /// Run a single cycle and exit
    Once,

    /// Validate the configuration and list the watched sites
    Check,

    /// Write an example configuration file
    Init {
        /// Output directory
        #[arg(default_value = ".")]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run => {
            let config = load_config(&cli.config, cli.verbose)?;
            commands::run::run_scheduled(config).await
        }
        Commands::Once => {
            let config = load_config(&cli.config, cli.verbose)?;
            commands::run::run_once(config).await
        }
        Commands::Check => {
            let config = load_config(&cli.config, cli.verbose)?;
            commands::check::check_config(&config)
        }
        Commands::Init { path } => {
            init_logging(&LoggingConfig::default(), cli.verbose)?;
            commands::init::init_config(path).await
        }
    }
}

/// Load and validate the configuration, then set up logging from it
fn load_config(path: &Path, verbose: u8) -> Result<Config> {
    let config = Config::load(path)?;
    init_logging(&config.logging, verbose)?;
    Ok(config)
}

/// Logs go to stderr so stdout carries only reports. `RUST_LOG` overrides
/// the configured level when set.
fn init_logging(logging: &LoggingConfig, verbose: u8) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.filter_directive(verbose)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    let result = match logging.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };
    result.map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}
