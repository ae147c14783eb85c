//! CLI command definitions
//!
//! Defines the clap commands for the tourcheck CLI.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run scenarios against the simulated browser
    Run {
        /// YAML scenario files (built-in scenarios run when none are given)
        files: Vec<PathBuf>,

        /// Also run the built-in onboarding scenarios
        #[arg(long)]
        builtin: bool,

        /// Location to open for each scenario, in order
        /// Can be specified multiple times: --location about:home --location about:newtab
        #[arg(long = "location", short = 'l')]
        locations: Vec<String>,

        /// Write a JSON report of every failure to this path
        #[arg(long)]
        report: Option<PathBuf>,

        /// Verbose output
        #[arg(long, short)]
        verbose: bool,
    },

    /// List scenarios and their expected identifiers
    List {
        /// YAML scenario files (built-in scenarios are listed when none are given)
        files: Vec<PathBuf>,

        /// Also list the built-in onboarding scenarios
        #[arg(long)]
        builtin: bool,
    },
}
