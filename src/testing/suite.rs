//! Sequential suite execution with console progress

use colored::Colorize;

use crate::automation::UiDriver;

use super::config::Scenario;
use super::context::LeakWarning;
use super::report::SuiteReport;
use super::runner::{run_scenario, Failure, RunOptions, RunOutcome};

/// Settings shared by every scenario in a suite
#[derive(Debug, Clone)]
pub struct SuiteOptions {
    pub run: RunOptions,
    /// Locations used by scenarios that don't name their own
    pub locations: Vec<String>,
    pub verbose: bool,
    /// Print progress to stdout
    pub print: bool,
}

/// Run scenarios one after another against the same driver
///
/// A failing scenario never stops the suite. Each run releases its handles
/// before the next one resets the baseline. Handles that could not be closed
/// are still open at every later reset; each later outcome lists them ahead
/// of its own warnings.
pub async fn run_suite<D: UiDriver + ?Sized>(
    driver: &mut D,
    scenarios: &[Scenario],
    options: &SuiteOptions,
) -> SuiteReport {
    let mut outcomes = Vec::with_capacity(scenarios.len());
    // Leaked handles with the scenario that opened them
    let mut outstanding: Vec<(String, LeakWarning)> = Vec::new();

    for scenario in scenarios {
        let locations = scenario.locations.as_deref().unwrap_or(&options.locations[..]);

        if options.print {
            print_header(scenario, locations, options.verbose);
        }

        let mut outcome = run_scenario(driver, scenario, locations, &options.run).await;
        carry_leaks(&mut outcome, &mut outstanding);

        if options.print {
            print_outcome(&outcome, options.verbose);
        }
        outcomes.push(outcome);
    }

    let report = SuiteReport::new(outcomes);
    if options.print {
        print_summary(&report);
    }
    report
}

/// Record earlier leaks on `outcome`, then remember its own
fn carry_leaks(outcome: &mut RunOutcome, outstanding: &mut Vec<(String, LeakWarning)>) {
    let own = outcome.warnings.clone();

    // A rejected scenario never reached the baseline reset
    let reset_issued = !matches!(
        outcome.failures.first(),
        Some(Failure::InvalidScenario { .. })
    );
    if reset_issued && !outstanding.is_empty() {
        tracing::warn!(
            scenario = %outcome.name,
            open = outstanding.len(),
            "Baseline reset issued with handles from earlier scenarios still open"
        );
        let mut warnings: Vec<LeakWarning> = outstanding
            .iter()
            .map(|(from, leak)| LeakWarning {
                handle: leak.handle,
                target: leak.target,
                reason: format!("still open from scenario '{}' at baseline reset", from),
            })
            .collect();
        warnings.append(&mut outcome.warnings);
        outcome.warnings = warnings;
    }

    outstanding.extend(own.into_iter().map(|leak| (outcome.name.clone(), leak)));
}

fn print_header(scenario: &Scenario, locations: &[String], verbose: bool) {
    println!(
        "\n{} {}",
        "Running Scenario:".blue().bold(),
        scenario.name.white().bold()
    );

    if let Some(desc) = &scenario.description {
        println!("  {}", desc.dimmed());
    }

    if verbose {
        for (key, value) in &scenario.config {
            println!("  {} = {}", key.dimmed(), value.to_string().dimmed());
        }
        println!("  Locations: {}", locations.join(", ").dimmed());
    }
}

fn print_outcome(outcome: &RunOutcome, verbose: bool) {
    println!(
        "  {} {}/{} locations driven",
        if outcome.locations_driven == outcome.locations_total {
            "✓".green()
        } else {
            "✗".red()
        },
        outcome.locations_driven,
        outcome.locations_total
    );

    for failure in &outcome.failures {
        println!("  {} {}", "✗".red(), failure);
    }

    if !outcome.passed || verbose {
        println!("  Expected: {}", format!("{:?}", outcome.expected).dimmed());
        match &outcome.rendered {
            Some(ids) => println!("  Rendered: {}", format!("{:?}", ids).dimmed()),
            None => println!("  Rendered: {}", "(not reached)".dimmed()),
        }
    }

    for warning in &outcome.warnings {
        println!(
            "  {} Handle {} (location {}) leaked: {}",
            "!".yellow(),
            warning.handle,
            warning.target,
            warning.reason
        );
    }

    if outcome.passed {
        println!("{} {}", "✓".green().bold(), "Scenario Passed".green().bold());
    } else {
        println!("{} {}", "✗".red().bold(), "Scenario Failed".red().bold());
    }
}

fn print_summary(report: &SuiteReport) {
    let line = report.summary_line();
    if report.all_passed() {
        println!("\n{}\n", line.green().bold());
    } else {
        println!("\n{}", line.red().bold());
        for outcome in report.failed() {
            println!("  {} {}", "✗".red(), outcome.name);
        }
        println!();
    }
}
