//! Context relevance: how applicable an intent is to the current application
//! state, independent of the utterance text.
//!
//! Rules are checked in a fixed order and the first one that applies decides:
//!
//! 1. no rule on the intent → [`ALWAYS`]
//! 2. patient required but none selected → [`MISSING_REQUIREMENT`]
//! 3. record required but none open → [`MISSING_REQUIREMENT`]
//! 4. rule lists views → [`ALWAYS`] if `*` or the current view is listed, else [`OTHER_VIEW`]
//! 5. anything else → [`UNSPECIFIED`]
//!
//! The requirement checks come before the view check, so a patient-bound
//! intent in one of its own views still scores [`MISSING_REQUIREMENT`]
//! without a patient.

use thea_core::ApplicationContext;

use crate::catalogue::Intent;

pub const ALWAYS: f32 = 1.0;
pub const MISSING_REQUIREMENT: f32 = 0.1;
pub const OTHER_VIEW: f32 = 0.3;
pub const UNSPECIFIED: f32 = 0.5;

pub fn context_relevance(intent: &Intent, context: &ApplicationContext) -> f32 {
    let Some(rule) = intent.context_relevance.as_ref() else {
        return ALWAYS;
    };

    if rule.requires_patient() && !context.has_patient() {
        return MISSING_REQUIREMENT;
    }

    if rule.requires_record() && !context.has_record() {
        return MISSING_REQUIREMENT;
    }

    match rule.matches_view(context.current_view) {
        Some(true) => ALWAYS,
        Some(false) => OTHER_VIEW,
        None => UNSPECIFIED,
    }
}
