//! Error types for tourcheck
//!
//! Collaborator and setup problems are `Error` values. Findings produced by
//! a scenario run (timeouts, mismatches, leaks) are reported as data in
//! [`crate::testing::RunOutcome`] instead.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for tourcheck
#[derive(Error, Debug)]
pub enum Error {
    // === Driver Errors ===
    #[error("Handle {0} is not open")]
    HandleNotFound(u64),

    #[error("Failed to open '{location}': {reason}")]
    OpenFailed { location: String, reason: String },

    #[error("Failed to close handle {handle}: {reason}")]
    CloseFailed { handle: u64, reason: String },

    #[error("Overlay is not available on '{0}'")]
    OverlayUnavailable(String),

    #[error("No element matches selector '{0}'")]
    SelectorNotFound(String),

    #[error("Driver error: {0}")]
    Driver(String),

    // === Scenario Errors ===
    #[error("Invalid scenario '{name}': {reason}")]
    InvalidScenario { name: String, reason: String },

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Create an invalid scenario error
    pub fn invalid_scenario(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidScenario {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    /// Create an open failed error
    pub fn open_failed(location: &str, reason: &str) -> Self {
        Self::OpenFailed {
            location: location.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a close failed error
    pub fn close_failed(handle: u64, reason: &str) -> Self {
        Self::CloseFailed {
            handle,
            reason: reason.to_string(),
        }
    }
}
