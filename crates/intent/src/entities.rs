//! Entity extraction from utterances.
//!
//! The recognizer merges whatever an [`EntityExtractor`] returns into its
//! result without post-processing.

use std::sync::LazyLock;

use regex::Regex;
use thea_core::{ApplicationContext, Entity, EntityType};

pub trait EntityExtractor: Send + Sync {
    fn extract(&self, text: &str, context: &ApplicationContext) -> Vec<Entity>;
}

/// Extractor that never finds anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEntities;

impl EntityExtractor for NoEntities {
    fn extract(&self, _text: &str, _context: &ApplicationContext) -> Vec<Entity> {
        Vec::new()
    }
}

struct EntityPattern {
    entity_type: EntityType,
    confidence: f32,
    regex: &'static LazyLock<Option<Regex>>,
}

macro_rules! entity_regex {
    ($name:ident, $regex_str:expr) => {
        static $name: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new($regex_str).ok());
    };
}

entity_regex!(ISO_DATE, r"\b\d{4}-\d{2}-\d{2}\b");
entity_regex!(SLASH_DATE, r"\b\d{1,2}/\d{1,2}/\d{2,4}\b");
entity_regex!(RELATIVE_DAY, r"(?i)\b(?:today|tonight|yesterday|tomorrow)\b");
entity_regex!(RELATIVE_PERIOD, r"(?i)\b(?:last|next|this|past)\s+(?:week|month|year)\b");
entity_regex!(AGO, r"(?i)\b\d+\s+(?:day|week|month|year)s?\s+ago\b");
// "may" alone is too common a word; it only counts with a day number.
entity_regex!(
    MONTH,
    r"(?i)\b(?:(?:january|february|march|april|june|july|august|september|october|november|december)(?:\s+\d{1,2}(?:st|nd|rd|th)?)?|may\s+\d{1,2}(?:st|nd|rd|th)?)(?:,?\s+\d{4})?\b"
);
entity_regex!(
    NAME_AFTER_CUE,
    r"\b(?i:patient|for|named|about)\s+(?P<name>[A-Z][a-z]+(?:\s+[A-Z][a-z]+)*)"
);
entity_regex!(DOCTOR, r"\b(?P<name>Dr\.?\s+[A-Z][a-z]+(?:\s+[A-Z][a-z]+)*)");

static PATTERNS: &[EntityPattern] = &[
    EntityPattern { entity_type: EntityType::Temporal, confidence: 0.95, regex: &ISO_DATE },
    EntityPattern { entity_type: EntityType::Temporal, confidence: 0.9, regex: &SLASH_DATE },
    EntityPattern { entity_type: EntityType::Temporal, confidence: 0.85, regex: &MONTH },
    EntityPattern { entity_type: EntityType::Temporal, confidence: 0.8, regex: &RELATIVE_DAY },
    EntityPattern { entity_type: EntityType::Temporal, confidence: 0.8, regex: &RELATIVE_PERIOD },
    EntityPattern { entity_type: EntityType::Temporal, confidence: 0.8, regex: &AGO },
    EntityPattern { entity_type: EntityType::Person, confidence: 0.8, regex: &DOCTOR },
    EntityPattern { entity_type: EntityType::Person, confidence: 0.7, regex: &NAME_AFTER_CUE },
];

/// Regex-based extractor for dates, relative time expressions and person
/// names introduced by a cue word ("patient", "for", "named", "about", "Dr.").
///
/// Overlapping spans are resolved in favour of the longer one, temporal
/// before person on equal length. Results are ordered by start offset.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternEntityExtractor;

impl PatternEntityExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl EntityExtractor for PatternEntityExtractor {
    fn extract(&self, text: &str, _context: &ApplicationContext) -> Vec<Entity> {
        let mut candidates: Vec<(usize, Entity)> = Vec::new();

        for (priority, pattern) in PATTERNS.iter().enumerate() {
            let Some(regex) = pattern.regex.as_ref() else {
                continue;
            };
            for caps in regex.captures_iter(text) {
                let Some(m) = caps.name("name").or_else(|| caps.get(0)) else {
                    continue;
                };
                candidates.push((
                    priority,
                    Entity::new(
                        pattern.entity_type,
                        m.as_str(),
                        m.start(),
                        m.end(),
                        pattern.confidence,
                    ),
                ));
            }
        }

        candidates.sort_by(|(pa, a), (pb, b)| {
            a.start_index
                .cmp(&b.start_index)
                .then(b.len().cmp(&a.len()))
                .then(pa.cmp(pb))
        });

        let mut entities: Vec<Entity> = Vec::with_capacity(candidates.len());
        for (_, entity) in candidates {
            let overlaps = entities
                .last()
                .is_some_and(|kept| entity.start_index < kept.end_index);
            if !overlaps {
                entities.push(entity);
            }
        }
        entities
    }
}
