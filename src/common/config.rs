//! Configuration file handling

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use super::paths::config_path;
use super::Result;
use crate::automation::Stage;

/// Main configuration structure
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Per-stage timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,

    /// Selectors used to drive and inspect the overlay
    #[serde(default)]
    pub selectors: Selectors,

    /// Run defaults
    #[serde(default)]
    pub run: RunDefaults,
}

/// Timeout settings in milliseconds, one per suspension point
#[derive(Debug, Deserialize, Clone)]
pub struct Timeouts {
    /// Baseline reset and configuration injection
    #[serde(default = "default_setup")]
    pub setup_ms: u64,

    /// Opening a new handle
    #[serde(default = "default_open")]
    pub open_ms: u64,

    /// Waiting for a location to finish loading
    #[serde(default = "default_load")]
    pub load_ms: u64,

    /// Waiting for the overlay's hidden sub-component to load
    #[serde(default = "default_overlay_loaded")]
    pub overlay_loaded_ms: u64,

    /// Waiting for the simulated activation to be dispatched
    #[serde(default = "default_activate")]
    pub activate_ms: u64,

    /// Waiting for the overlay to report itself opened
    #[serde(default = "default_overlay_opened")]
    pub overlay_opened_ms: u64,

    /// Querying rendered identifiers
    #[serde(default = "default_query")]
    pub query_ms: u64,

    /// Closing a handle during cleanup
    #[serde(default = "default_close")]
    pub close_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            setup_ms: default_setup(),
            open_ms: default_open(),
            load_ms: default_load(),
            overlay_loaded_ms: default_overlay_loaded(),
            activate_ms: default_activate(),
            overlay_opened_ms: default_overlay_opened(),
            query_ms: default_query(),
            close_ms: default_close(),
        }
    }
}

impl Timeouts {
    /// Use the same bound for every stage
    pub fn uniform(ms: u64) -> Self {
        Self {
            setup_ms: ms,
            open_ms: ms,
            load_ms: ms,
            overlay_loaded_ms: ms,
            activate_ms: ms,
            overlay_opened_ms: ms,
            query_ms: ms,
            close_ms: ms,
        }
    }

    /// Name of the first timeout set to zero, if any
    fn first_zero(&self) -> Option<&'static str> {
        [
            ("setup_ms", self.setup_ms),
            ("open_ms", self.open_ms),
            ("load_ms", self.load_ms),
            ("overlay_loaded_ms", self.overlay_loaded_ms),
            ("activate_ms", self.activate_ms),
            ("overlay_opened_ms", self.overlay_opened_ms),
            ("query_ms", self.query_ms),
            ("close_ms", self.close_ms),
        ]
        .into_iter()
        .find(|(_, ms)| *ms == 0)
        .map(|(name, _)| name)
    }

    /// Bound for a driver call made at `stage`
    pub fn for_stage(&self, stage: Stage) -> Duration {
        let ms = match stage {
            Stage::Reset | Stage::Configure => self.setup_ms,
            Stage::Open => self.open_ms,
            Stage::Load => self.load_ms,
            Stage::OverlayLoaded => self.overlay_loaded_ms,
            Stage::Activate => self.activate_ms,
            Stage::OverlayOpened => self.overlay_opened_ms,
            Stage::Query => self.query_ms,
            Stage::Close => self.close_ms,
        };
        Duration::from_millis(ms)
    }
}

fn default_setup() -> u64 {
    5_000
}
fn default_open() -> u64 {
    5_000
}
fn default_load() -> u64 {
    30_000
}
fn default_overlay_loaded() -> u64 {
    10_000
}
fn default_activate() -> u64 {
    5_000
}
fn default_overlay_opened() -> u64 {
    10_000
}
fn default_query() -> u64 {
    5_000
}
fn default_close() -> u64 {
    5_000
}

/// Selectors for the overlay under test
#[derive(Debug, Deserialize, Clone)]
pub struct Selectors {
    /// Surface that receives the primary activation
    #[serde(default = "default_overlay_button")]
    pub overlay_button: String,

    /// Marker shared by every rendered tour item
    #[serde(default = "default_tour_item")]
    pub tour_item: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            overlay_button: default_overlay_button(),
            tour_item: default_tour_item(),
        }
    }
}

fn default_overlay_button() -> String {
    "#onboarding-overlay-button".to_string()
}

fn default_tour_item() -> String {
    ".onboarding-tour-item".to_string()
}

/// Defaults applied when a scenario doesn't specify them
#[derive(Debug, Deserialize, Clone)]
pub struct RunDefaults {
    /// Locations opened for every scenario, in order
    #[serde(default = "default_locations")]
    pub locations: Vec<String>,
}

impl Default for RunDefaults {
    fn default() -> Self {
        Self {
            locations: default_locations(),
        }
    }
}

fn default_locations() -> Vec<String> {
    vec![
        "about:newtab".to_string(),
        "about:home".to_string(),
        "about:welcome".to_string(),
    ]
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| super::Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| super::Error::ConfigParse(e.to_string()))?;
        if config.run.locations.is_empty() {
            return Err(super::Error::Config(
                "run.locations must name at least one location".to_string(),
            ));
        }
        if let Some(name) = config.timeouts.first_zero() {
            return Err(super::Error::Config(format!(
                "timeouts.{} must be greater than zero",
                name
            )));
        }
        Ok(config)
    }
}
