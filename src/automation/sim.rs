//! In-process simulated browser
//!
//! Implements [`UiDriver`] with a preference store, a tab table and an
//! onboarding overlay that renders its tour list from preferences. Faults
//! can be injected per stage and per tab so the runner's timeout and
//! cleanup paths are exercisable without a real browser.

use async_trait::async_trait;
use std::collections::BTreeMap;

use super::onboarding::{
    resolve_tour_ids, TourType, CURRENT_TOURSET_VERSION, DEFAULT_NEW_TOUR, DEFAULT_UPDATE_TOUR,
    OVERLAY_BUTTON_SELECTOR, PREF_NEW_TOUR, PREF_SEEN_TOURSET_VERSION, PREF_TOURSET_VERSION,
    PREF_TOUR_TYPE, PREF_UPDATE_TOUR, TOUR_ITEM_SELECTOR,
};
use super::{EnvironmentConfig, Handle, PrefValue, Stage, UiDriver};
use crate::common::{Error, Result};

/// Pages that host the onboarding overlay
const OVERLAY_PAGES: &[&str] = &["about:newtab", "about:home", "about:welcome"];

/// Injected misbehavior, keyed by stage and by the order in which tabs were
/// opened since the last baseline reset (0-based)
#[derive(Debug, Clone, Default)]
pub struct Faults {
    /// Never complete this stage for this tab
    pub stall: Option<(Stage, usize)>,
    /// Fail this stage for this tab with a driver error
    pub fail: Option<(Stage, usize)>,
    /// Every close fails and the tab stays open
    pub fail_close: bool,
    /// Tour item queries come back empty
    pub render_nothing: bool,
}

#[derive(Debug)]
struct Tab {
    index: usize,
    location: String,
    loaded: bool,
    overlay: Option<Overlay>,
}

#[derive(Debug)]
struct Overlay {
    tour_ids: Vec<String>,
    open: bool,
}

/// Simulated browser with a shared preference store
#[derive(Debug)]
pub struct SimBrowser {
    prefs: EnvironmentConfig,
    tabs: BTreeMap<Handle, Tab>,
    next_handle: u64,
    opened_since_reset: usize,
    faults: Faults,
}

impl Default for SimBrowser {
    fn default() -> Self {
        Self::new()
    }
}

impl SimBrowser {
    pub fn new() -> Self {
        Self::with_faults(Faults::default())
    }

    pub fn with_faults(faults: Faults) -> Self {
        Self {
            prefs: baseline(),
            tabs: BTreeMap::new(),
            next_handle: 1,
            opened_since_reset: 0,
            faults,
        }
    }

    /// Number of tabs currently open
    pub fn open_handles(&self) -> usize {
        self.tabs.len()
    }

    pub fn prefs(&self) -> &EnvironmentConfig {
        &self.prefs
    }

    pub fn pref(&self, key: &str) -> Option<&PrefValue> {
        self.prefs.get(key)
    }

    fn tab(&self, handle: Handle) -> Result<&Tab> {
        self.tabs.get(&handle).ok_or(Error::HandleNotFound(handle.0))
    }

    fn tab_mut(&mut self, handle: Handle) -> Result<&mut Tab> {
        self.tabs.get_mut(&handle).ok_or(Error::HandleNotFound(handle.0))
    }

    /// Apply injected faults for `stage` on the tab at `index`
    async fn checkpoint(&self, stage: Stage, index: usize) -> Result<()> {
        tokio::task::yield_now().await;

        if self.faults.stall == Some((stage, index)) {
            tracing::debug!(%stage, index, "Stalling stage");
            std::future::pending::<()>().await;
        }
        if self.faults.fail == Some((stage, index)) {
            return Err(Error::Driver(format!(
                "Injected failure at {} for tab {}",
                stage, index
            )));
        }
        Ok(())
    }

    fn int_pref(&self, key: &str) -> Result<i64> {
        self.prefs
            .get(key)
            .and_then(PrefValue::as_int)
            .ok_or_else(|| Error::Driver(format!("Preference '{}' is not an integer", key)))
    }

    fn str_pref(&self, key: &str) -> Result<String> {
        self.prefs
            .get(key)
            .and_then(PrefValue::as_str)
            .map(str::to_string)
            .ok_or_else(|| Error::Driver(format!("Preference '{}' is not a string", key)))
    }

    /// Pick the tour list the overlay renders
    ///
    /// A tourset newer than the last seen one switches to the update tour
    /// and marks the new version as seen.
    fn resolve_tour(&mut self) -> Result<Vec<String>> {
        let tourset = self.int_pref(PREF_TOURSET_VERSION)?;
        let seen = self.int_pref(PREF_SEEN_TOURSET_VERSION)?;
        let mut tour_type: TourType = self.str_pref(PREF_TOUR_TYPE)?.parse()?;

        if seen < tourset {
            tour_type = TourType::Update;
            self.prefs
                .insert(PREF_TOUR_TYPE.to_string(), tour_type.as_str().into());
            self.prefs
                .insert(PREF_SEEN_TOURSET_VERSION.to_string(), tourset.into());
        }

        let list = self.str_pref(tour_type.list_pref())?;
        Ok(resolve_tour_ids(&list))
    }
}

/// Preferences of a fresh profile
fn baseline() -> EnvironmentConfig {
    let mut prefs = EnvironmentConfig::new();
    prefs.insert(PREF_TOUR_TYPE.to_string(), "new".into());
    prefs.insert(
        PREF_TOURSET_VERSION.to_string(),
        CURRENT_TOURSET_VERSION.into(),
    );
    prefs.insert(
        PREF_SEEN_TOURSET_VERSION.to_string(),
        CURRENT_TOURSET_VERSION.into(),
    );
    prefs.insert(PREF_NEW_TOUR.to_string(), DEFAULT_NEW_TOUR.into());
    prefs.insert(PREF_UPDATE_TOUR.to_string(), DEFAULT_UPDATE_TOUR.into());
    prefs
}

/// Reject values the overlay can't interpret
fn validate_pref(key: &str, value: &PrefValue) -> Result<()> {
    let ok = match key {
        PREF_TOURSET_VERSION | PREF_SEEN_TOURSET_VERSION => value.as_int().is_some(),
        PREF_NEW_TOUR | PREF_UPDATE_TOUR => value.as_str().is_some(),
        PREF_TOUR_TYPE => match value.as_str() {
            Some(s) => s.parse::<TourType>().is_ok(),
            None => false,
        },
        _ => true,
    };
    if ok {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "Invalid value {} for preference '{}'",
            value, key
        )))
    }
}

#[async_trait]
impl UiDriver for SimBrowser {
    async fn reset_to_baseline(&mut self) -> Result<()> {
        if !self.tabs.is_empty() {
            tracing::warn!(open = self.tabs.len(), "Resetting with tabs still open");
        }
        self.prefs = baseline();
        self.opened_since_reset = 0;
        Ok(())
    }

    async fn apply_config(&mut self, config: &EnvironmentConfig) -> Result<()> {
        for (key, value) in config {
            validate_pref(key, value)?;
        }
        for (key, value) in config {
            tracing::debug!(pref = %key, %value, "Setting preference");
            self.prefs.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    async fn open(&mut self, location: &str) -> Result<Handle> {
        if location.trim().is_empty() {
            return Err(Error::open_failed(location, "empty location"));
        }

        let index = self.opened_since_reset;
        self.checkpoint(Stage::Open, index).await?;

        let handle = Handle(self.next_handle);
        self.next_handle += 1;
        self.opened_since_reset += 1;
        self.tabs.insert(
            handle,
            Tab {
                index,
                location: location.to_string(),
                loaded: false,
                overlay: None,
            },
        );
        Ok(handle)
    }

    async fn close(&mut self, handle: Handle) -> Result<()> {
        let index = self.tab(handle)?.index;
        self.checkpoint(Stage::Close, index).await?;

        if self.faults.fail_close {
            return Err(Error::close_failed(handle.0, "tab refused to close"));
        }
        self.tabs.remove(&handle);
        Ok(())
    }

    async fn await_load(&mut self, handle: Handle, location: &str) -> Result<()> {
        let index = self.tab(handle)?.index;
        self.checkpoint(Stage::Load, index).await?;

        let tab = self.tab_mut(handle)?;
        if tab.location != location {
            return Err(Error::Driver(format!(
                "Tab {} is at '{}', not '{}'",
                handle, tab.location, location
            )));
        }
        tab.loaded = true;
        Ok(())
    }

    async fn await_overlay_loaded(&mut self, handle: Handle) -> Result<()> {
        let index = self.tab(handle)?.index;
        self.checkpoint(Stage::OverlayLoaded, index).await?;

        let tab = self.tab(handle)?;
        if !tab.loaded {
            return Err(Error::Driver(format!("Tab {} has not loaded", handle)));
        }
        if !OVERLAY_PAGES.contains(&tab.location.as_str()) {
            return Err(Error::OverlayUnavailable(tab.location.clone()));
        }

        let tour_ids = self.resolve_tour()?;
        self.tab_mut(handle)?.overlay = Some(Overlay {
            tour_ids,
            open: false,
        });
        Ok(())
    }

    async fn activate(&mut self, handle: Handle, selector: &str) -> Result<()> {
        let index = self.tab(handle)?.index;
        self.checkpoint(Stage::Activate, index).await?;

        if selector != OVERLAY_BUTTON_SELECTOR {
            return Err(Error::SelectorNotFound(selector.to_string()));
        }
        match self.tab_mut(handle)?.overlay.as_mut() {
            Some(overlay) => {
                overlay.open = true;
                Ok(())
            }
            None => Err(Error::SelectorNotFound(selector.to_string())),
        }
    }

    async fn await_overlay_opened(&mut self, handle: Handle) -> Result<()> {
        let index = self.tab(handle)?.index;
        self.checkpoint(Stage::OverlayOpened, index).await?;

        let open = self
            .tab(handle)?
            .overlay
            .as_ref()
            .map(|o| o.open)
            .unwrap_or(false);
        if !open {
            // The opened signal never fires for an overlay nobody clicked
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn query_ordered_ids(&mut self, handle: Handle, selector: &str) -> Result<Vec<String>> {
        let index = self.tab(handle)?.index;
        self.checkpoint(Stage::Query, index).await?;

        if self.faults.render_nothing || selector != TOUR_ITEM_SELECTOR {
            return Ok(Vec::new());
        }
        Ok(self
            .tab(handle)?
            .overlay
            .as_ref()
            .map(|o| o.tour_ids.clone())
            .unwrap_or_default())
    }
}
