//! tourcheck - ordered UI-state scenario runner
//!
//! Drives an onboarding tour overlay through configuration variants and
//! checks that the rendered tour items appear in the expected order.

pub mod automation;
pub mod cli;
pub mod commands;
pub mod common;
pub mod testing;

// Re-export commonly used types for tests
pub use automation::{EnvironmentConfig, Handle, PrefValue, SimBrowser, Stage, UiDriver};
pub use common::{Error, Result};
pub use testing::{run_scenario, run_suite, Failure, RunOptions, RunOutcome, Scenario};
