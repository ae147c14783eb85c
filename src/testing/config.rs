//! Test scenario configuration types
//!
//! Defines the data structures for deserializing YAML test scenarios.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

use crate::automation::{EnvironmentConfig, PrefValue};
use crate::common::{Error, Result};

/// A named combination of configuration and expected ordered outcome
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Scenario {
    /// Name of the test scenario
    pub name: String,
    /// Optional description of what the test verifies
    #[serde(default)]
    pub description: Option<String>,
    /// Options injected after the baseline reset, before any location opens
    #[serde(default)]
    pub config: EnvironmentConfig,
    /// Locations to drive, overriding the configured defaults
    #[serde(default)]
    pub locations: Option<Vec<String>>,
    /// Identifiers the overlay must render, in display order
    pub expect: Vec<String>,
}

impl Scenario {
    pub fn new<S: Into<String>>(name: &str, expect: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.to_string(),
            description: None,
            config: EnvironmentConfig::new(),
            locations: None,
            expect: expect.into_iter().map(Into::into).collect(),
        }
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Add one option to the injected configuration
    pub fn pref(mut self, key: &str, value: impl Into<PrefValue>) -> Self {
        self.config.insert(key.to_string(), value.into());
        self
    }

    pub fn locations<S: Into<String>>(mut self, locations: impl IntoIterator<Item = S>) -> Self {
        self.locations = Some(locations.into_iter().map(Into::into).collect());
        self
    }

    /// Check that the expectation is non-empty and free of duplicates
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::invalid_scenario(&self.name, "name must not be empty"));
        }
        if self.expect.is_empty() {
            return Err(Error::invalid_scenario(
                &self.name,
                "expect must list at least one identifier",
            ));
        }

        let mut seen = HashSet::new();
        for id in &self.expect {
            if !seen.insert(id.as_str()) {
                return Err(Error::invalid_scenario(
                    &self.name,
                    format!("identifier '{}' appears more than once in expect", id),
                ));
            }
        }

        if let Some(locations) = &self.locations {
            if locations.is_empty() {
                return Err(Error::invalid_scenario(
                    &self.name,
                    "locations, when given, must not be empty",
                ));
            }
        }
        Ok(())
    }

    /// Parse and validate a scenario from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        let scenario: Scenario = serde_yaml::from_str(content)?;
        scenario.validate()?;
        Ok(scenario)
    }
}

/// Load a scenario from a YAML file
pub fn load_scenario(path: &Path) -> Result<Scenario> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.display().to_string(),
        error: e.to_string(),
    })?;

    Scenario::from_yaml(&content).map_err(|e| match e {
        Error::Yaml(err) => Error::Config(format!(
            "Failed to parse test scenario '{}': {}",
            path.display(),
            err
        )),
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_scenario() {
        let scenario = Scenario::from_yaml(
            r#"
name: custom-update
description: update tour in custom order
config:
  browser.onboarding.tour-type: update
  browser.onboarding.tourset-version: 1
locations: ["about:home"]
expect:
  - onboarding-tour-customize
  - onboarding-tour-addons
"#,
        )
        .unwrap();

        assert_eq!(scenario.name, "custom-update");
        assert_eq!(
            scenario.config["browser.onboarding.tourset-version"],
            PrefValue::Int(1)
        );
        assert_eq!(scenario.locations, Some(vec!["about:home".to_string()]));
        assert_eq!(scenario.expect.len(), 2);
    }

    #[test]
    fn test_config_is_optional() {
        let scenario = Scenario::from_yaml("name: plain\nexpect: [a]\n").unwrap();
        assert!(scenario.config.is_empty());
        assert!(scenario.locations.is_none());
    }

    #[test]
    fn test_empty_expect_rejected() {
        let err = Scenario::from_yaml("name: empty\nexpect: []\n").unwrap_err();
        assert!(matches!(err, Error::InvalidScenario { .. }));
    }

    #[test]
    fn test_duplicate_expect_rejected() {
        let err = Scenario::new("dup", ["a", "b", "a"]).validate().unwrap_err();
        assert!(err.to_string().contains("'a' appears more than once"));
    }

    #[test]
    fn test_empty_locations_rejected() {
        let scenario = Scenario::new("nowhere", ["a"]).locations(Vec::<String>::new());
        assert!(scenario.validate().is_err());
    }

    #[test]
    fn test_missing_expect_is_parse_error() {
        assert!(matches!(
            Scenario::from_yaml("name: nothing\n"),
            Err(Error::Yaml(_))
        ));
    }

    #[test]
    fn test_load_scenario_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.yaml");
        std::fs::write(&path, "name: [unterminated\n").unwrap();

        let err = load_scenario(&path).unwrap_err();
        assert!(err.to_string().contains("broken.yaml"));
    }
}
