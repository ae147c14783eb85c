//! Scenario runner implementation
//!
//! Drives a [`UiDriver`] through one scenario: baseline reset, configuration
//! injection, per-location overlay activation, a query of the last opened
//! handle, cleanup and the ordered comparison. Driver errors and timeouts
//! become [`Failure`] values so cleanup always runs before the outcome is
//! returned.

use std::fmt;
use std::future::Future;

use serde::Serialize;

use crate::automation::{Handle, Stage, UiDriver};
use crate::common::config::{Selectors, Timeouts};
use crate::common::{Error, Result};

use super::config::Scenario;
use super::context::{ExecutionContext, LeakWarning};

/// Driver settings for a run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub timeouts: Timeouts,
    pub selectors: Selectors,
}

/// A single reason a scenario failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Failure {
    /// The scenario was rejected before any driver call
    InvalidScenario { reason: String },
    /// A suspension point did not complete in time
    StageTimeout {
        stage: Stage,
        /// Location index, absent for reset and configuration
        target: Option<usize>,
        after_ms: u64,
    },
    /// The driver reported an error at a stage
    StageError {
        stage: Stage,
        target: Option<usize>,
        message: String,
    },
    /// Rendered and expected sequences differ in length
    LengthMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },
    /// Rendered and expected identifiers differ at `index`
    Mismatch {
        index: usize,
        expected: Option<String>,
        actual: Option<String>,
    },
}

impl Failure {
    /// Stage and location index for stage failures
    pub fn stage(&self) -> Option<(Stage, Option<usize>)> {
        match self {
            Failure::StageTimeout { stage, target, .. }
            | Failure::StageError { stage, target, .. } => Some((*stage, *target)),
            _ => None,
        }
    }

    pub fn is_assertion(&self) -> bool {
        matches!(
            self,
            Failure::LengthMismatch { .. } | Failure::Mismatch { .. }
        )
    }
}

fn describe_target(target: &Option<usize>) -> String {
    match target {
        Some(i) => format!(" at location {}", i),
        None => String::new(),
    }
}

fn describe_id(id: &Option<String>) -> String {
    match id {
        Some(id) => format!("'{}'", id),
        None => "nothing".to_string(),
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::InvalidScenario { reason } => write!(f, "Invalid scenario: {}", reason),
            Failure::StageTimeout {
                stage,
                target,
                after_ms,
            } => write!(
                f,
                "Stage '{}'{} timed out after {}ms",
                stage,
                describe_target(target),
                after_ms
            ),
            Failure::StageError {
                stage,
                target,
                message,
            } => write!(
                f,
                "Stage '{}'{} failed: {}",
                stage,
                describe_target(target),
                message
            ),
            Failure::LengthMismatch { expected, actual } => write!(
                f,
                "Expected {} identifiers, got {}. Expected: {:?}, got: {:?}",
                expected.len(),
                actual.len(),
                expected,
                actual
            ),
            Failure::Mismatch {
                index,
                expected,
                actual,
            } => write!(
                f,
                "Identifier {}: expected {}, got {}",
                index,
                describe_id(expected),
                describe_id(actual)
            ),
        }
    }
}

/// Result of one scenario run
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub name: String,
    pub passed: bool,
    /// Primary failures, in the order they were detected
    pub failures: Vec<Failure>,
    /// Cleanup problems; never affect `passed`
    pub warnings: Vec<LeakWarning>,
    pub expected: Vec<String>,
    /// Identifiers read from the last handle, absent if the run never got there
    pub rendered: Option<Vec<String>>,
    /// Locations fully driven before the run stopped
    pub locations_driven: usize,
    pub locations_total: usize,
    /// Handles still tracked after cleanup
    pub handles_remaining: usize,
}

impl RunOutcome {
    pub fn timed_out(&self) -> bool {
        self.failures
            .iter()
            .any(|f| matches!(f, Failure::StageTimeout { .. }))
    }
}

/// Compare rendered identifiers against the expected order
///
/// A length difference is reported on its own and does not hide the
/// positional comparison, which covers every index of the longer sequence.
pub fn compare_ordered(expected: &[String], actual: &[String]) -> Vec<Failure> {
    let mut failures = Vec::new();

    if expected.len() != actual.len() {
        failures.push(Failure::LengthMismatch {
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        });
    }

    for index in 0..expected.len().max(actual.len()) {
        let want = expected.get(index);
        let got = actual.get(index);
        if want != got {
            failures.push(Failure::Mismatch {
                index,
                expected: want.cloned(),
                actual: got.cloned(),
            });
        }
    }

    failures
}

/// Run a driver call bounded by the stage's timeout
async fn bounded<T, F>(
    timeouts: &Timeouts,
    stage: Stage,
    target: Option<usize>,
    call: F,
) -> std::result::Result<T, Failure>
where
    F: Future<Output = Result<T>>,
{
    let limit = timeouts.for_stage(stage);
    match tokio::time::timeout(limit, call).await {
        Ok(Ok(value)) => {
            tracing::debug!(%stage, ?target, "Stage complete");
            Ok(value)
        }
        Ok(Err(e)) => Err(Failure::StageError {
            stage,
            target,
            message: e.to_string(),
        }),
        Err(_) => Err(Failure::StageTimeout {
            stage,
            target,
            after_ms: limit.as_millis() as u64,
        }),
    }
}

/// Open and drive every location, pushing each handle as soon as it exists
async fn drive_locations<D: UiDriver + ?Sized>(
    driver: &mut D,
    context: &mut ExecutionContext,
    locations: &[String],
    options: &RunOptions,
    driven: &mut usize,
) -> std::result::Result<Handle, Failure> {
    let timeouts = &options.timeouts;

    for (i, location) in locations.iter().enumerate() {
        let target = Some(i);
        tracing::debug!(location = %location, index = i, "Opening location");

        let handle = bounded(timeouts, Stage::Open, target, driver.open(location)).await?;
        context.push(handle);

        bounded(
            timeouts,
            Stage::Load,
            target,
            driver.await_load(handle, location),
        )
        .await?;
        bounded(
            timeouts,
            Stage::OverlayLoaded,
            target,
            driver.await_overlay_loaded(handle),
        )
        .await?;
        bounded(
            timeouts,
            Stage::Activate,
            target,
            driver.activate(handle, &options.selectors.overlay_button),
        )
        .await?;
        bounded(
            timeouts,
            Stage::OverlayOpened,
            target,
            driver.await_overlay_opened(handle),
        )
        .await?;

        *driven += 1;
    }

    // Every iteration re-renders the same shared overlay state, so only the
    // last handle reflects the fully configured tour.
    context.last().ok_or_else(|| Failure::StageError {
        stage: Stage::Open,
        target: None,
        message: "no locations to drive".to_string(),
    })
}

/// Reset, configure, drive and query; cleanup is left to the caller
async fn execute<D: UiDriver + ?Sized>(
    driver: &mut D,
    context: &mut ExecutionContext,
    scenario: &Scenario,
    locations: &[String],
    options: &RunOptions,
    driven: &mut usize,
) -> std::result::Result<Vec<String>, Failure> {
    let timeouts = &options.timeouts;

    bounded(timeouts, Stage::Reset, None, driver.reset_to_baseline()).await?;
    bounded(
        timeouts,
        Stage::Configure,
        None,
        driver.apply_config(&scenario.config),
    )
    .await?;

    let last = drive_locations(driver, context, locations, options, driven).await?;
    let target = Some(context.len() - 1);

    bounded(
        timeouts,
        Stage::Query,
        target,
        driver.query_ordered_ids(last, &options.selectors.tour_item),
    )
    .await
}

/// Outcome for a scenario that failed validation; no driver call was made
fn rejected(scenario: &Scenario, locations: &[String], error: Error) -> RunOutcome {
    let reason = match error {
        Error::InvalidScenario { reason, .. } => reason,
        other => other.to_string(),
    };
    tracing::warn!(scenario = %scenario.name, %reason, "Rejecting scenario");

    RunOutcome {
        name: scenario.name.clone(),
        passed: false,
        failures: vec![Failure::InvalidScenario { reason }],
        warnings: Vec::new(),
        expected: scenario.expect.clone(),
        rendered: None,
        locations_driven: 0,
        locations_total: locations.len(),
        handles_remaining: 0,
    }
}

/// Run one scenario against `locations`
///
/// The scenario is validated before the baseline reset. The execution
/// context is released in reverse creation order on every path before the
/// outcome is built, so a returned outcome never owns open handles.
pub async fn run_scenario<D: UiDriver + ?Sized>(
    driver: &mut D,
    scenario: &Scenario,
    locations: &[String],
    options: &RunOptions,
) -> RunOutcome {
    if let Err(e) = scenario.validate() {
        return rejected(scenario, locations, e);
    }

    tracing::info!(scenario = %scenario.name, locations = locations.len(), "Running scenario");

    let mut context = ExecutionContext::new();
    let mut driven = 0;
    let mut failures = Vec::new();

    let rendered = match execute(
        driver,
        &mut context,
        scenario,
        locations,
        options,
        &mut driven,
    )
    .await
    {
        Ok(ids) => Some(ids),
        Err(failure) => {
            tracing::warn!(scenario = %scenario.name, %failure, "Scenario aborted");
            failures.push(failure);
            None
        }
    };

    let warnings = context
        .release(driver, options.timeouts.for_stage(Stage::Close))
        .await;

    if let Some(ids) = &rendered {
        failures.extend(compare_ordered(&scenario.expect, ids));
    }

    let passed = failures.is_empty();
    tracing::info!(
        scenario = %scenario.name,
        passed,
        failures = failures.len(),
        leaks = warnings.len(),
        "Scenario finished"
    );

    RunOutcome {
        name: scenario.name.clone(),
        passed,
        failures,
        warnings,
        expected: scenario.expect.clone(),
        rendered,
        locations_driven: driven,
        locations_total: locations.len(),
        handles_remaining: context.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::onboarding::{default_new_tour_ids, PREF_NEW_TOUR};
    use crate::automation::{EnvironmentConfig, Faults, SimBrowser};
    use crate::common::logging::init_for_tests;
    use async_trait::async_trait;

    /// Driver that logs every call as `stage#handle`
    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
        next: u64,
        stall: Option<(Stage, Handle)>,
        rendered: Vec<String>,
    }

    impl Recorder {
        async fn step(&mut self, stage: Stage, handle: Option<Handle>) -> Result<()> {
            self.calls.push(match handle {
                Some(h) => format!("{}{}", stage, h),
                None => stage.to_string(),
            });
            if let Some(h) = handle {
                if self.stall == Some((stage, h)) {
                    std::future::pending::<()>().await;
                }
            }
            Ok(())
        }
    }

    #[async_trait]
    impl UiDriver for Recorder {
        async fn reset_to_baseline(&mut self) -> Result<()> {
            self.step(Stage::Reset, None).await
        }

        async fn apply_config(&mut self, _config: &EnvironmentConfig) -> Result<()> {
            self.step(Stage::Configure, None).await
        }

        async fn open(&mut self, _location: &str) -> Result<Handle> {
            self.next += 1;
            let handle = Handle(self.next);
            self.step(Stage::Open, Some(handle)).await?;
            Ok(handle)
        }

        async fn close(&mut self, handle: Handle) -> Result<()> {
            self.step(Stage::Close, Some(handle)).await
        }

        async fn await_load(&mut self, handle: Handle, _location: &str) -> Result<()> {
            self.step(Stage::Load, Some(handle)).await
        }

        async fn await_overlay_loaded(&mut self, handle: Handle) -> Result<()> {
            self.step(Stage::OverlayLoaded, Some(handle)).await
        }

        async fn activate(&mut self, handle: Handle, _selector: &str) -> Result<()> {
            self.step(Stage::Activate, Some(handle)).await
        }

        async fn await_overlay_opened(&mut self, handle: Handle) -> Result<()> {
            self.step(Stage::OverlayOpened, Some(handle)).await
        }

        async fn query_ordered_ids(&mut self, handle: Handle, _selector: &str) -> Result<Vec<String>> {
            self.step(Stage::Query, Some(handle)).await?;
            Ok(self.rendered.clone())
        }
    }

    fn drive_calls(handle: u64) -> Vec<String> {
        ["open", "load", "overlay_loaded", "activate", "overlay_opened"]
            .iter()
            .map(|stage| format!("{}#{}", stage, handle))
            .collect()
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn locations() -> Vec<String> {
        ids(&["about:newtab", "about:home", "about:welcome"])
    }

    fn fast_options() -> RunOptions {
        RunOptions {
            timeouts: Timeouts::uniform(100),
            selectors: Selectors::default(),
        }
    }

    #[test]
    fn test_compare_equal() {
        let expected = ids(&["a", "b", "c"]);
        assert!(compare_ordered(&expected, &expected).is_empty());
    }

    #[test]
    fn test_compare_permutation_fails() {
        let failures = compare_ordered(&ids(&["a", "b", "c"]), &ids(&["b", "a", "c"]));
        assert_eq!(
            failures,
            vec![
                Failure::Mismatch {
                    index: 0,
                    expected: Some("a".to_string()),
                    actual: Some("b".to_string()),
                },
                Failure::Mismatch {
                    index: 1,
                    expected: Some("b".to_string()),
                    actual: Some("a".to_string()),
                },
            ]
        );
    }

    #[test]
    fn test_compare_length_mismatch_keeps_positional_detail() {
        let failures = compare_ordered(&ids(&["a", "b"]), &ids(&["a", "x", "y"]));
        assert!(matches!(failures[0], Failure::LengthMismatch { .. }));
        assert_eq!(failures.len(), 3);
        assert_eq!(
            failures[2],
            Failure::Mismatch {
                index: 2,
                expected: None,
                actual: Some("y".to_string()),
            }
        );
    }

    #[test]
    fn test_failure_display() {
        let timeout = Failure::StageTimeout {
            stage: Stage::OverlayOpened,
            target: Some(2),
            after_ms: 100,
        };
        assert_eq!(
            timeout.to_string(),
            "Stage 'overlay_opened' at location 2 timed out after 100ms"
        );

        let mismatch = Failure::Mismatch {
            index: 1,
            expected: Some("a".to_string()),
            actual: None,
        };
        assert_eq!(mismatch.to_string(), "Identifier 1: expected 'a', got nothing");
    }

    #[tokio::test]
    async fn test_default_scenario_passes() {
        init_for_tests();
        let mut browser = SimBrowser::new();
        let scenario = Scenario::new("default", default_new_tour_ids());

        let outcome = run_scenario(&mut browser, &scenario, &locations(), &fast_options()).await;

        assert!(outcome.passed, "failures: {:?}", outcome.failures);
        assert_eq!(outcome.rendered, Some(default_new_tour_ids()));
        assert_eq!(outcome.locations_driven, 3);
        assert_eq!(outcome.handles_remaining, 0);
        assert_eq!(browser.open_handles(), 0);
    }

    #[tokio::test]
    async fn test_wrong_order_fails_but_cleans_up() {
        let mut browser = SimBrowser::new();
        let scenario = Scenario::new(
            "swapped",
            ["onboarding-tour-addons", "onboarding-tour-private-browsing"],
        )
        .pref(PREF_NEW_TOUR, "private,addons");

        let outcome = run_scenario(&mut browser, &scenario, &locations(), &fast_options()).await;

        assert!(!outcome.passed);
        assert_eq!(outcome.failures.len(), 2);
        assert!(outcome.failures.iter().all(Failure::is_assertion));
        assert_eq!(browser.open_handles(), 0);
    }

    #[tokio::test]
    async fn test_empty_render_is_length_mismatch() {
        let mut browser = SimBrowser::with_faults(Faults {
            render_nothing: true,
            ..Faults::default()
        });
        let scenario = Scenario::new("empty", default_new_tour_ids());

        let outcome = run_scenario(&mut browser, &scenario, &locations(), &fast_options()).await;

        assert!(!outcome.passed);
        assert!(matches!(
            outcome.failures[0],
            Failure::LengthMismatch { .. }
        ));
        assert_eq!(outcome.rendered, Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_timeout_skips_remaining_locations_and_cleans_up() {
        let mut browser = SimBrowser::with_faults(Faults {
            stall: Some((Stage::OverlayOpened, 1)),
            ..Faults::default()
        });
        let scenario = Scenario::new("stalled", default_new_tour_ids());

        let outcome = run_scenario(&mut browser, &scenario, &locations(), &fast_options()).await;

        assert!(!outcome.passed);
        assert!(outcome.timed_out());
        assert_eq!(
            outcome.failures,
            vec![Failure::StageTimeout {
                stage: Stage::OverlayOpened,
                target: Some(1),
                after_ms: 100,
            }]
        );
        assert_eq!(outcome.locations_driven, 1);
        assert!(outcome.rendered.is_none());
        assert_eq!(outcome.handles_remaining, 0);
        assert_eq!(browser.open_handles(), 0);
    }

    #[tokio::test]
    async fn test_driver_error_is_stage_error() {
        let mut browser = SimBrowser::new();
        let scenario = Scenario::new("off-page", default_new_tour_ids());
        let locations = ids(&["about:newtab", "https://example.com/"]);

        let outcome = run_scenario(&mut browser, &scenario, &locations, &fast_options()).await;

        assert_eq!(
            outcome.failures[0].stage(),
            Some((Stage::OverlayLoaded, Some(1)))
        );
        assert_eq!(browser.open_handles(), 0);
    }

    #[tokio::test]
    async fn test_leak_does_not_mask_verdict() {
        let mut browser = SimBrowser::with_faults(Faults {
            fail_close: true,
            ..Faults::default()
        });
        let scenario = Scenario::new("leaky", default_new_tour_ids());

        let outcome = run_scenario(&mut browser, &scenario, &locations(), &fast_options()).await;

        assert!(outcome.passed);
        assert_eq!(outcome.warnings.len(), 3);
        assert_eq!(outcome.handles_remaining, 0);
        assert_eq!(browser.open_handles(), 3);
    }

    #[tokio::test]
    async fn test_no_locations_is_reported() {
        let mut browser = SimBrowser::new();
        let scenario = Scenario::new("nowhere", default_new_tour_ids());

        let outcome = run_scenario(&mut browser, &scenario, &[], &fast_options()).await;

        assert!(!outcome.passed);
        assert!(matches!(outcome.failures[0], Failure::StageError { .. }));
    }

    #[tokio::test]
    async fn test_invalid_config_is_configure_error() {
        let mut browser = SimBrowser::new();
        let scenario = Scenario::new("bad-type", default_new_tour_ids())
            .pref("browser.onboarding.tour-type", "sideways");

        let outcome = run_scenario(&mut browser, &scenario, &locations(), &fast_options()).await;

        assert_eq!(outcome.failures[0].stage(), Some((Stage::Configure, None)));
        assert_eq!(outcome.locations_driven, 0);
    }

    #[tokio::test]
    async fn test_driver_call_sequence() {
        let mut recorder = Recorder {
            rendered: ids(&["a", "b"]),
            ..Recorder::default()
        };
        let scenario = Scenario::new("ordered", ["a", "b"]).pref("x", 1_i64);

        let outcome = run_scenario(&mut recorder, &scenario, &locations(), &fast_options()).await;

        assert!(outcome.passed, "failures: {:?}", outcome.failures);
        let mut expected = ids(&["reset", "configure"]);
        for handle in 1..=3 {
            expected.extend(drive_calls(handle));
        }
        expected.extend(ids(&["query#3", "close#3", "close#2", "close#1"]));
        assert_eq!(recorder.calls, expected);
    }

    #[tokio::test]
    async fn test_call_sequence_stops_at_timeout() {
        let mut recorder = Recorder {
            stall: Some((Stage::OverlayLoaded, Handle(2))),
            ..Recorder::default()
        };
        let scenario = Scenario::new("stalled", ["a"]);

        let outcome = run_scenario(&mut recorder, &scenario, &locations(), &fast_options()).await;

        assert_eq!(
            outcome.failures,
            vec![Failure::StageTimeout {
                stage: Stage::OverlayLoaded,
                target: Some(1),
                after_ms: 100,
            }]
        );
        let mut expected = ids(&["reset", "configure"]);
        expected.extend(drive_calls(1));
        expected.extend(ids(&["open#2", "load#2", "overlay_loaded#2", "close#2", "close#1"]));
        assert_eq!(recorder.calls, expected);
    }

    #[tokio::test]
    async fn test_empty_expect_rejected_before_driver() {
        let mut browser = SimBrowser::with_faults(Faults {
            render_nothing: true,
            ..Faults::default()
        });
        let scenario = Scenario::new("empty", Vec::<String>::new());

        let outcome = run_scenario(&mut browser, &scenario, &locations(), &fast_options()).await;

        assert!(!outcome.passed);
        assert!(matches!(
            outcome.failures[..],
            [Failure::InvalidScenario { .. }]
        ));
        assert!(outcome.rendered.is_none());
        assert_eq!(outcome.locations_driven, 0);
    }

    #[tokio::test]
    async fn test_duplicate_expect_rejected_before_driver() {
        let mut recorder = Recorder::default();
        let scenario = Scenario::new("dup", ["a", "b", "a"]);

        let outcome = run_scenario(&mut recorder, &scenario, &locations(), &fast_options()).await;

        assert!(!outcome.passed);
        match &outcome.failures[0] {
            Failure::InvalidScenario { reason } => {
                assert!(reason.contains("'a' appears more than once"))
            }
            other => panic!("Expected InvalidScenario, got {:?}", other),
        }
        assert!(recorder.calls.is_empty());
    }
}
