//! stationdb CLI Binary
//!
//! Command-line front end for the station directory.

use anyhow::{Context, Result};
use clap::Parser;
use stationdb::config::ConfigLoader;
use stationdb::logging::init_logging;
use stationdb::tooling::cli::{Cli, CliContext};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ConfigLoader::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(db_file) = &cli.db_file {
        config.db_file = db_file.clone();
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.logging.format = format.clone();
    }
    if let Some(output) = &cli.log_output {
        config.logging.output = output.clone();
    }
    init_logging(Some(&config.logging)).context("initializing logging")?;

    let mut context = CliContext::new(&config)
        .with_context(|| format!("opening {}", config.db_file.display()))?;
    let output = context.execute(&cli.command)?;
    println!("{}", output);
    Ok(())
}
