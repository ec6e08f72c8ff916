//! Intent catalogue: the static set of intents, their example phrases and
//! context-relevance rules.
//!
//! The default catalogue is compiled into the crate from `data/intents.yml`.
//! Custom catalogues can be loaded from a YAML string or file with the same
//! shape.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thea_core::View;
use tracing::debug;

const BUNDLED_INTENTS: &str = include_str!("../data/intents.yml");

/// View entry that matches every view.
pub const ANY_VIEW: &str = "*";

/// Conditions under which an intent applies, independent of the text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextRelevanceRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub views: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_patient: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_record: Option<bool>,
}

impl ContextRelevanceRule {
    pub fn requires_patient(&self) -> bool {
        self.requires_patient.unwrap_or(false)
    }

    pub fn requires_record(&self) -> bool {
        self.requires_record.unwrap_or(false)
    }

    /// Whether the view list contains the wildcard or `view` itself.
    /// `None` when the rule lists no views.
    pub fn matches_view(&self, view: View) -> Option<bool> {
        self.views.as_ref().map(|views| {
            views
                .iter()
                .any(|v| v == ANY_VIEW || v.eq_ignore_ascii_case(view.as_str()))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub name: String,
    pub examples: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_relevance: Option<ContextRelevanceRule>,
}

impl Intent {
    pub fn new<I, S>(name: impl Into<String>, examples: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            examples: examples.into_iter().map(Into::into).collect(),
            context_relevance: None,
        }
    }

    pub fn with_rule(mut self, rule: ContextRelevanceRule) -> Self {
        self.context_relevance = Some(rule);
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogueError {
    #[error("failed to parse intent catalogue: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("intent with empty name")]
    EmptyName,

    #[error("duplicate intent '{0}'")]
    DuplicateIntent(String),

    #[error("intent '{0}' has no examples")]
    NoExamples(String),

    #[error("intent '{intent}' references unknown view '{view}'")]
    UnknownView { intent: String, view: String },
}

#[derive(Deserialize)]
struct CatalogueFile {
    intents: Vec<Intent>,
}

/// Validated, ordered list of intents.
#[derive(Debug, Clone)]
pub struct IntentCatalogue {
    intents: Vec<Intent>,
}

impl IntentCatalogue {
    /// Validate and wrap a list of intents. Order is kept as given; it is the
    /// tie-break order during ranking.
    pub fn new(intents: Vec<Intent>) -> Result<Self, CatalogueError> {
        let mut seen = HashSet::new();
        for intent in &intents {
            if intent.name.trim().is_empty() {
                return Err(CatalogueError::EmptyName);
            }
            if !seen.insert(intent.name.as_str()) {
                return Err(CatalogueError::DuplicateIntent(intent.name.clone()));
            }
            if intent.examples.is_empty() {
                return Err(CatalogueError::NoExamples(intent.name.clone()));
            }
            let views = intent
                .context_relevance
                .as_ref()
                .and_then(|r| r.views.as_ref());
            for view in views.into_iter().flatten() {
                if view != ANY_VIEW && View::from_str(view).is_err() {
                    return Err(CatalogueError::UnknownView {
                        intent: intent.name.clone(),
                        view: view.clone(),
                    });
                }
            }
        }
        Ok(Self { intents })
    }

    /// The catalogue shipped with the crate.
    pub fn bundled() -> Result<Self, CatalogueError> {
        Self::from_yaml_str(BUNDLED_INTENTS)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, CatalogueError> {
        let file: CatalogueFile = serde_yaml::from_str(yaml)?;
        let catalogue = Self::new(file.intents)?;
        debug!(
            intents = catalogue.len(),
            examples = catalogue.unique_examples().len(),
            "intent catalogue parsed"
        );
        Ok(catalogue)
    }

    pub fn from_path(path: &Path) -> Result<Self, CatalogueError> {
        let yaml = std::fs::read_to_string(path).map_err(|source| CatalogueError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&yaml)
    }

    pub fn intents(&self) -> &[Intent] {
        &self.intents
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Intent> {
        self.intents.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Intent> {
        self.intents.iter().find(|i| i.name == name)
    }

    pub fn len(&self) -> usize {
        self.intents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }

    /// Every example phrase across all intents, deduplicated, in first-seen order.
    pub fn unique_examples(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.intents
            .iter()
            .flat_map(|i| i.examples.iter())
            .map(String::as_str)
            .filter(|e| seen.insert(*e))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_catalogue_parses() {
        let catalogue = IntentCatalogue::bundled().unwrap();
        assert!(catalogue.len() >= 10);
        assert!(catalogue.get("greeting").unwrap().context_relevance.is_none());

        let allergies = catalogue.get("show_allergies").unwrap();
        let rule = allergies.context_relevance.as_ref().unwrap();
        assert_eq!(rule.views.as_deref(), Some(&["summary".to_string()][..]));
        assert!(rule.requires_patient());
        assert!(!rule.requires_record());
    }

    #[test]
    fn unique_examples_dedups_in_order() {
        let catalogue = IntentCatalogue::new(vec![
            Intent::new("a", ["one", "two"]),
            Intent::new("b", ["two", "three", "one"]),
        ])
        .unwrap();
        assert_eq!(catalogue.unique_examples(), vec!["one", "two", "three"]);
    }

    #[test]
    fn rejects_duplicate_names() {
        let err = IntentCatalogue::new(vec![
            Intent::new("a", ["x"]),
            Intent::new("a", ["y"]),
        ])
        .unwrap_err();
        assert!(matches!(err, CatalogueError::DuplicateIntent(name) if name == "a"));
    }

    #[test]
    fn rejects_intent_without_examples() {
        let err = IntentCatalogue::new(vec![Intent::new("empty", Vec::<String>::new())])
            .unwrap_err();
        assert!(matches!(err, CatalogueError::NoExamples(_)));
    }

    #[test]
    fn rejects_unknown_view() {
        let yaml = r#"
intents:
  - name: weird
    examples: [hello]
    context_relevance:
      views: [dashboard]
"#;
        let err = IntentCatalogue::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, CatalogueError::UnknownView { view, .. } if view == "dashboard"));
    }

    #[test]
    fn wildcard_view_matches_everything() {
        let rule = ContextRelevanceRule {
            views: Some(vec![ANY_VIEW.to_string()]),
            ..Default::default()
        };
        for view in View::ALL {
            assert_eq!(rule.matches_view(view), Some(true));
        }
        assert_eq!(ContextRelevanceRule::default().matches_view(View::Summary), None);
    }

    #[test]
    fn from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("intents.yml");
        std::fs::write(&path, "intents:\n  - name: ping\n    examples: [ping]\n").unwrap();
        let catalogue = IntentCatalogue::from_path(&path).unwrap();
        assert_eq!(catalogue.len(), 1);

        let missing = IntentCatalogue::from_path(&dir.path().join("nope.yml"));
        assert!(matches!(missing, Err(CatalogueError::Io { .. })));
    }
}
