//! Built-in onboarding tourset scenarios

use crate::automation::onboarding::{
    default_new_tour_ids, PREF_NEW_TOUR, PREF_SEEN_TOURSET_VERSION, PREF_TOURSET_VERSION,
    PREF_TOUR_TYPE, PREF_UPDATE_TOUR,
};

use super::config::Scenario;

/// Default tour set, a custom new-user tour set and a custom update tour set
pub fn scenarios() -> Vec<Scenario> {
    vec![
        Scenario::new("default-new-tourset", default_new_tour_ids())
            .description("Fresh profile renders the full default new-user tour"),
        Scenario::new(
            "custom-new-tourset",
            [
                "onboarding-tour-private-browsing",
                "onboarding-tour-addons",
                "onboarding-tour-customize",
            ],
        )
        .description("New-user tour follows the configured list order")
        .pref(PREF_TOUR_TYPE, "new")
        .pref(PREF_TOURSET_VERSION, 1_i64)
        .pref(PREF_SEEN_TOURSET_VERSION, 1_i64)
        .pref(PREF_NEW_TOUR, "private,addons,customize"),
        Scenario::new(
            "custom-update-tourset",
            [
                "onboarding-tour-customize",
                "onboarding-tour-private-browsing",
                "onboarding-tour-addons",
            ],
        )
        .description("Update tour follows the configured list order")
        .pref(PREF_TOUR_TYPE, "update")
        .pref(PREF_TOURSET_VERSION, 1_i64)
        .pref(PREF_SEEN_TOURSET_VERSION, 1_i64)
        .pref(PREF_UPDATE_TOUR, "customize,private,addons"),
    ]
}
