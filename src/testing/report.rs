//! Suite report
//!
//! Aggregates scenario outcomes and writes the structured JSON report: one
//! entry per failure, cleanup warnings listed separately.

use serde::Serialize;
use std::path::Path;

use crate::common::Result;

use super::context::LeakWarning;
use super::runner::{Failure, RunOutcome};

/// Outcomes of every scenario in a suite, in run order
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub outcomes: Vec<RunOutcome>,
}

/// Pass/fail counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub passed: usize,
    pub total: usize,
}

#[derive(Debug, Serialize)]
struct FailureEntry<'a> {
    scenario: &'a str,
    #[serde(flatten)]
    failure: &'a Failure,
}

#[derive(Debug, Serialize)]
struct WarningEntry<'a> {
    scenario: &'a str,
    #[serde(flatten)]
    warning: &'a LeakWarning,
}

#[derive(Debug, Serialize)]
struct ScenarioEntry<'a> {
    name: &'a str,
    passed: bool,
    expected: &'a [String],
    rendered: Option<&'a [String]>,
}

#[derive(Debug, Serialize)]
struct ReportFile<'a> {
    summary: Summary,
    scenarios: Vec<ScenarioEntry<'a>>,
    failures: Vec<FailureEntry<'a>>,
    warnings: Vec<WarningEntry<'a>>,
}

impl SuiteReport {
    pub fn new(outcomes: Vec<RunOutcome>) -> Self {
        Self { outcomes }
    }

    pub fn summary(&self) -> Summary {
        Summary {
            passed: self.outcomes.iter().filter(|o| o.passed).count(),
            total: self.outcomes.len(),
        }
    }

    pub fn all_passed(&self) -> bool {
        self.outcomes.iter().all(|o| o.passed)
    }

    /// Human-readable summary line
    pub fn summary_line(&self) -> String {
        let Summary { passed, total } = self.summary();
        format!("{} of {} scenarios passed", passed, total)
    }

    pub fn failed(&self) -> impl Iterator<Item = &RunOutcome> {
        self.outcomes.iter().filter(|o| !o.passed)
    }

    fn report_file(&self) -> ReportFile<'_> {
        ReportFile {
            summary: self.summary(),
            scenarios: self
                .outcomes
                .iter()
                .map(|o| ScenarioEntry {
                    name: &o.name,
                    passed: o.passed,
                    expected: &o.expected,
                    rendered: o.rendered.as_deref(),
                })
                .collect(),
            failures: self
                .outcomes
                .iter()
                .flat_map(|o| {
                    o.failures.iter().map(move |failure| FailureEntry {
                        scenario: &o.name,
                        failure,
                    })
                })
                .collect(),
            warnings: self
                .outcomes
                .iter()
                .flat_map(|o| {
                    o.warnings.iter().map(move |warning| WarningEntry {
                        scenario: &o.name,
                        warning,
                    })
                })
                .collect(),
        }
    }

    /// Render the structured report as pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.report_file())?)
    }

    /// Write the structured report to `path`
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        std::fs::write(path, json)?;
        tracing::debug!(path = %path.display(), "Wrote report");
        Ok(())
    }
}
