//! Onboarding tour catalogue and preference names
//!
//! Tour lists are stored as comma-separated short names in preferences and
//! rendered as `onboarding-tour-*` element ids.

use std::fmt;
use std::str::FromStr;

use crate::common::Error;

pub const PREF_TOUR_TYPE: &str = "browser.onboarding.tour-type";
pub const PREF_TOURSET_VERSION: &str = "browser.onboarding.tourset-version";
pub const PREF_SEEN_TOURSET_VERSION: &str = "browser.onboarding.seen-tourset-version";
pub const PREF_NEW_TOUR: &str = "browser.onboarding.newtour";
pub const PREF_UPDATE_TOUR: &str = "browser.onboarding.updatetour";

/// Surface that opens the overlay
pub const OVERLAY_BUTTON_SELECTOR: &str = "#onboarding-overlay-button";
/// Marker carried by every rendered tour item
pub const TOUR_ITEM_SELECTOR: &str = ".onboarding-tour-item";

/// Tourset version shipped with the baseline profile
pub const CURRENT_TOURSET_VERSION: i64 = 1;

pub const DEFAULT_NEW_TOUR: &str = "private,addons,customize,search,default,sync";
pub const DEFAULT_UPDATE_TOUR: &str = "performance,library,screenshots,singlesearch,customize,sync";

/// Short name to element id
static TOURS: &[(&str, &str)] = &[
    ("private", "onboarding-tour-private-browsing"),
    ("addons", "onboarding-tour-addons"),
    ("customize", "onboarding-tour-customize"),
    ("search", "onboarding-tour-search"),
    ("default", "onboarding-tour-default-browser"),
    ("sync", "onboarding-tour-sync"),
    ("performance", "onboarding-tour-performance"),
    ("library", "onboarding-tour-library"),
    ("screenshots", "onboarding-tour-screenshots"),
    ("singlesearch", "onboarding-tour-singlesearch"),
];

/// Which tour set the overlay shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TourType {
    New,
    Update,
}

impl TourType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TourType::New => "new",
            TourType::Update => "update",
        }
    }

    /// Preference holding this type's tour list
    pub fn list_pref(&self) -> &'static str {
        match self {
            TourType::New => PREF_NEW_TOUR,
            TourType::Update => PREF_UPDATE_TOUR,
        }
    }
}

impl FromStr for TourType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(TourType::New),
            "update" => Ok(TourType::Update),
            other => Err(Error::Driver(format!(
                "Unknown tour type '{}'. Expected 'new' or 'update'",
                other
            ))),
        }
    }
}

impl fmt::Display for TourType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Element id for a tour short name
pub fn tour_id(name: &str) -> Option<&'static str> {
    TOURS.iter().find(|(short, _)| *short == name).map(|(_, id)| *id)
}

/// Resolve a comma-separated tour list into element ids
///
/// Unknown names and repeats are skipped; order is preserved.
pub fn resolve_tour_ids(list: &str) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for name in list.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        match tour_id(name) {
            Some(id) if !ids.iter().any(|seen| seen == id) => ids.push(id.to_string()),
            Some(_) => {}
            None => tracing::debug!(tour = name, "Skipping unknown tour"),
        }
    }
    ids
}

/// Ids rendered for a fresh profile
pub fn default_new_tour_ids() -> Vec<String> {
    resolve_tour_ids(DEFAULT_NEW_TOUR)
}
