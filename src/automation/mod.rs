//! UI automation collaborator interface
//!
//! The scenario runner never talks to a browser directly. Everything it
//! needs (baseline reset, preference injection, handle lifecycle, overlay
//! interaction, DOM queries) goes through the [`UiDriver`] trait.

pub mod onboarding;
pub mod sim;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::common::Result;

pub use sim::{Faults, SimBrowser};

/// Opaque handle to one open UI surface (a browser tab)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Handle(pub u64);

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single preference value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrefValue {
    Bool(bool),
    Int(i64),
    String(String),
}

impl PrefValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            PrefValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PrefValue::String(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for PrefValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrefValue::Bool(v) => write!(f, "{}", v),
            PrefValue::Int(v) => write!(f, "{}", v),
            PrefValue::String(v) => write!(f, "\"{}\"", v),
        }
    }
}

impl From<bool> for PrefValue {
    fn from(v: bool) -> Self {
        PrefValue::Bool(v)
    }
}

impl From<i64> for PrefValue {
    fn from(v: i64) -> Self {
        PrefValue::Int(v)
    }
}

impl From<&str> for PrefValue {
    fn from(v: &str) -> Self {
        PrefValue::String(v.to_string())
    }
}

impl From<String> for PrefValue {
    fn from(v: String) -> Self {
        PrefValue::String(v)
    }
}

/// Batch of named options injected before any handle is opened
pub type EnvironmentConfig = BTreeMap<String, PrefValue>;

/// Stages of a scenario run that touch the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Reset,
    Configure,
    Open,
    Load,
    OverlayLoaded,
    Activate,
    OverlayOpened,
    Query,
    Close,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Reset => "reset",
            Stage::Configure => "configure",
            Stage::Open => "open",
            Stage::Load => "load",
            Stage::OverlayLoaded => "overlay_loaded",
            Stage::Activate => "activate",
            Stage::OverlayOpened => "overlay_opened",
            Stage::Query => "query",
            Stage::Close => "close",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capabilities the scenario runner needs from a UI automation backend
///
/// Every method may suspend. The runner bounds each call with a timeout
/// and drops the future when it expires, so implementations must not rely
/// on a call running to completion.
#[async_trait]
pub trait UiDriver: Send {
    /// Restore default configuration and overlay "seen" state. Idempotent.
    async fn reset_to_baseline(&mut self) -> Result<()>;

    /// Apply every entry of `config` or none of them
    async fn apply_config(&mut self, config: &EnvironmentConfig) -> Result<()>;

    /// Open a new foreground surface that will navigate to `location`
    async fn open(&mut self, location: &str) -> Result<Handle>;

    /// Close a surface previously returned by [`UiDriver::open`]
    async fn close(&mut self, handle: Handle) -> Result<()>;

    /// Wait until `handle` has fully loaded `location`
    async fn await_load(&mut self, handle: Handle, location: &str) -> Result<()>;

    /// Wait until the overlay's hidden sub-component finished its initial load
    async fn await_overlay_loaded(&mut self, handle: Handle) -> Result<()>;

    /// Dispatch a primary-button activation at the center of `selector`
    async fn activate(&mut self, handle: Handle, selector: &str) -> Result<()>;

    /// Wait until the overlay reports itself fully opened
    async fn await_overlay_opened(&mut self, handle: Handle) -> Result<()>;

    /// Identifiers of every element matching `selector`, in document order
    async fn query_ordered_ids(&mut self, handle: Handle, selector: &str) -> Result<Vec<String>>;
}
