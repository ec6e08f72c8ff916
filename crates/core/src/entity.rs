use serde::{Deserialize, Serialize};

/// Kind of span an entity extractor can recognise in an utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Person,
    Temporal,
    None,
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityType::Person => write!(f, "person"),
            EntityType::Temporal => write!(f, "temporal"),
            EntityType::None => write!(f, "none"),
        }
    }
}

/// A span of the utterance tagged with an entity type.
///
/// `start_index` / `end_index` are byte offsets into the original text
/// (end exclusive), so `&text[start_index..end_index] == value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub entity_type: EntityType,
    pub value: String,
    pub start_index: usize,
    pub end_index: usize,
    pub confidence: f32,
}

impl Entity {
    pub fn new(
        entity_type: EntityType,
        value: impl Into<String>,
        start_index: usize,
        end_index: usize,
        confidence: f32,
    ) -> Self {
        Self {
            entity_type,
            value: value.into(),
            start_index,
            end_index,
            confidence,
        }
    }

    pub fn len(&self) -> usize {
        self.end_index.saturating_sub(self.start_index)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
