//! tourcheck - ordered UI-state scenario runner
//!
//! Runs onboarding tour scenarios and exits non-zero when any of them fail.

use clap::Parser;
use commands::Commands;
use std::path::PathBuf;
use tourcheck::common::config::Config;
use tourcheck::common::{logging, paths, Result};
use tourcheck::{cli, commands};

#[derive(Parser)]
#[command(name = "tourcheck", about = "Ordered UI-state scenario runner")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (default: platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Append detailed logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Append detailed logs to the default log file
    #[arg(long, global = true)]
    log: bool,
}

async fn run(cli: Cli) -> Result<bool> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    cli::dispatch(cli.command, &config).await
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_file = cli
        .log_file
        .clone()
        .or_else(|| if cli.log { paths::default_log_file() } else { None });
    let guard = logging::init_cli(log_file.as_deref());

    let code = match run(cli).await {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(e) => {
            eprintln!("Error: {e}");
            2
        }
    };

    drop(guard);
    std::process::exit(code);
}
