//! CLI command handling
//!
//! Loads scenarios, runs them and formats output.

use colored::Colorize;
use std::path::PathBuf;

use crate::automation::SimBrowser;
use crate::commands::Commands;
use crate::common::config::Config;
use crate::common::Result;
use crate::testing::{self, load_scenario, run_suite, RunOptions, Scenario, SuiteOptions};

/// Dispatch a CLI command
///
/// Returns `Ok(false)` when scenarios ran and at least one failed.
pub async fn dispatch(command: Commands, config: &Config) -> Result<bool> {
    match command {
        Commands::Run {
            files,
            builtin,
            locations,
            report,
            verbose,
        } => {
            let scenarios = collect_scenarios(&files, builtin)?;

            let options = SuiteOptions {
                run: RunOptions {
                    timeouts: config.timeouts.clone(),
                    selectors: config.selectors.clone(),
                },
                locations: if locations.is_empty() {
                    config.run.locations.clone()
                } else {
                    locations
                },
                verbose,
                print: true,
            };

            let mut browser = SimBrowser::new();
            let suite = run_suite(&mut browser, &scenarios, &options).await;

            if let Some(path) = report {
                suite.write_json(&path)?;
                println!("Report written to {}", path.display());
            }

            Ok(suite.all_passed())
        }

        Commands::List { files, builtin } => {
            let scenarios = collect_scenarios(&files, builtin)?;
            for scenario in &scenarios {
                print_scenario(scenario);
            }
            Ok(true)
        }
    }
}

/// Load scenario files, adding the built-in set when asked or when no
/// files are given
fn collect_scenarios(files: &[PathBuf], builtin: bool) -> Result<Vec<Scenario>> {
    let mut scenarios = Vec::new();
    if builtin || files.is_empty() {
        scenarios.extend(testing::builtin::scenarios());
    }
    for path in files {
        scenarios.push(load_scenario(path)?);
    }
    Ok(scenarios)
}

fn print_scenario(scenario: &Scenario) {
    println!("{}", scenario.name.white().bold());
    if let Some(desc) = &scenario.description {
        println!("  {}", desc.dimmed());
    }
    for (key, value) in &scenario.config {
        println!("  {} = {}", key, value);
    }
    if let Some(locations) = &scenario.locations {
        println!("  Locations: {}", locations.join(", "));
    }
    for (i, id) in scenario.expect.iter().enumerate() {
        println!("  {:>2}. {}", i + 1, id);
    }
}
