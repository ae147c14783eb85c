//! Scenario harness
//!
//! Runs scenarios that reset the environment, inject configuration, drive
//! the overlay on a sequence of locations and compare the rendered
//! identifiers against an expected order. Every run releases the handles it
//! opened before reporting.

pub mod builtin;
mod config;
mod context;
mod report;
mod runner;
mod suite;

pub use config::{load_scenario, Scenario};
pub use context::{ExecutionContext, LeakWarning};
pub use report::{SuiteReport, Summary};
pub use runner::{compare_ordered, run_scenario, Failure, RunOptions, RunOutcome};
pub use suite::{run_suite, SuiteOptions};
