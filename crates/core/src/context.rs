//! Application context snapshot consumed by the assistant.
//!
//! The context is owned by the host application; the assistant only reads a
//! copy of it per recognition call.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TheaError;

/// Screens of the health-records application the user can be looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    Landing,
    Patients,
    Summary,
    Timeline,
    Records,
    Medications,
    Settings,
    Assistant,
}

impl View {
    pub const ALL: [View; 8] = [
        View::Landing,
        View::Patients,
        View::Summary,
        View::Timeline,
        View::Records,
        View::Medications,
        View::Settings,
        View::Assistant,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            View::Landing => "landing",
            View::Patients => "patients",
            View::Summary => "summary",
            View::Timeline => "timeline",
            View::Records => "records",
            View::Medications => "medications",
            View::Settings => "settings",
            View::Assistant => "assistant",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for View {
    type Err = TheaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        View::ALL
            .iter()
            .copied()
            .find(|v| v.as_str() == needle)
            .ok_or_else(|| TheaError::UnknownView(s.to_string()))
    }
}

/// Reference to the patient currently selected in the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientRef {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl PatientRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Snapshot of the host application state at the time of an utterance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationContext {
    pub current_view: View,
    #[serde(default)]
    pub current_patient: Option<PatientRef>,
    #[serde(default)]
    pub current_record_id: Option<String>,
    #[serde(default)]
    pub debug_mode: bool,
}

impl ApplicationContext {
    pub fn new(current_view: View) -> Self {
        Self {
            current_view,
            ..Self::default()
        }
    }

    pub fn with_patient(mut self, patient: PatientRef) -> Self {
        self.current_patient = Some(patient);
        self
    }

    pub fn with_record(mut self, record_id: impl Into<String>) -> Self {
        self.current_record_id = Some(record_id.into());
        self
    }

    pub fn with_debug(mut self, debug_mode: bool) -> Self {
        self.debug_mode = debug_mode;
        self
    }

    pub fn has_patient(&self) -> bool {
        self.current_patient.is_some()
    }

    pub fn has_record(&self) -> bool {
        self.current_record_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_parse_is_case_insensitive() {
        assert_eq!("Summary".parse::<View>().unwrap(), View::Summary);
        assert_eq!(" timeline ".parse::<View>().unwrap(), View::Timeline);
        assert!(matches!(
            "dashboard".parse::<View>(),
            Err(TheaError::UnknownView(_))
        ));
    }

    #[test]
    fn view_roundtrips_through_display() {
        for view in View::ALL {
            assert_eq!(view.to_string().parse::<View>().unwrap(), view);
        }
    }

    #[test]
    fn context_builders() {
        let ctx = ApplicationContext::new(View::Summary)
            .with_patient(PatientRef::new("p-1").with_name("Ada"))
            .with_record("r-9");
        assert!(ctx.has_patient());
        assert!(ctx.has_record());
        assert!(!ctx.debug_mode);

        let empty = ApplicationContext::default();
        assert_eq!(empty.current_view, View::Landing);
        assert!(!empty.has_patient());
    }

    #[test]
    fn context_deserializes_with_missing_optionals() {
        let ctx: ApplicationContext =
            serde_json::from_str(r#"{"current_view":"records"}"#).unwrap();
        assert_eq!(ctx.current_view, View::Records);
        assert!(ctx.current_patient.is_none());
        assert!(ctx.current_record_id.is_none());
    }
}
