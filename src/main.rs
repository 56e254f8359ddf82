//! montage - video contact sheet generator
//!
//! # Usage
//!
//! ```bash
//! montage jpg movie.mkv --columns 5 --rows 6
//! montage gif ./videos -o ./sheets --clip-duration 1.5 --fps 8
//! montage inspect movie.mkv --json
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;

use montage_cli::adapters::{LogFormat, LogSettings, TracingLogAdapter};
use montage_cli::app::DefaultAppContainer;
use montage_cli::cli::{commands, Cli, Commands};
use montage_cli::config_initialization::initialize_configuration;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let format: LogFormat = cli.log_format.parse()?;
    let settings = LogSettings::resolve(&cli.log_level, cli.verbose, cli.quiet, format);
    TracingLogAdapter::init(&settings)?;
    debug!("Starting montage {}", env!("CARGO_PKG_VERSION"));

    let config = initialize_configuration(&cli)?;
    let container = DefaultAppContainer::new().context("Failed to initialize media backend")?;

    match &cli.command {
        Commands::Jpg(_) | Commands::Gif(_) => commands::montage(&container, &config).await,
        Commands::Inspect(args) => commands::inspect(&container, &config, args.json).await,
    }
}
