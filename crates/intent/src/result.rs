use serde::{Deserialize, Serialize};
use thea_core::{ApplicationContext, Entity};

/// Best-scoring example of one intent for one utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentMatch {
    pub intent: String,
    /// Catalogue example that produced the score.
    pub example: String,
    /// Cosine similarity clamped to [0, 1].
    pub score: f32,
    pub context_relevance: f32,
    /// `score * context_relevance`; the ranking key.
    pub combined_score: f32,
}

impl IntentMatch {
    pub fn new(intent: &str, example: &str, similarity: f32, context_relevance: f32) -> Self {
        let score = similarity.clamp(0.0, 1.0);
        Self {
            intent: intent.to_string(),
            example: example.to_string(),
            score,
            context_relevance,
            combined_score: score * context_relevance,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentRecognitionResult {
    pub text: String,
    /// One entry per intent, highest `combined_score` first.
    pub intents: Vec<IntentMatch>,
    pub top_intent: Option<IntentMatch>,
    pub entities: Vec<Entity>,
    pub context: ApplicationContext,
    /// Set when the model could not be loaded and no intents were scored.
    #[serde(default)]
    pub degraded: bool,
}

impl IntentRecognitionResult {
    pub fn new(
        text: &str,
        intents: Vec<IntentMatch>,
        entities: Vec<Entity>,
        context: ApplicationContext,
    ) -> Self {
        let top_intent = intents.first().cloned();
        Self {
            text: text.to_string(),
            intents,
            top_intent,
            entities,
            context,
            degraded: false,
        }
    }

    /// Result returned when no model is available.
    pub fn degraded(text: &str, entities: Vec<Entity>, context: ApplicationContext) -> Self {
        Self {
            degraded: true,
            ..Self::new(text, Vec::new(), entities, context)
        }
    }

    /// Top intent if its combined score reaches `threshold`.
    pub fn confident_top(&self, threshold: f32) -> Option<&IntentMatch> {
        self.top_intent
            .as_ref()
            .filter(|m| m.combined_score >= threshold)
    }

    pub fn find(&self, intent: &str) -> Option<&IntentMatch> {
        self.intents.iter().find(|m| m.intent == intent)
    }
}
