use std::sync::{Arc, RwLock};

use thea_core::ApplicationContext;
use thiserror::Error;
use tracing::{debug, warn};

use crate::embedding::EmbeddingError;
use crate::entities::{EntityExtractor, PatternEntityExtractor};
use crate::lifecycle::ModelLifecycle;
use crate::result::IntentRecognitionResult;
use crate::scoring::rank_intents;

#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("failed to embed utterance: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("embedder returned no vector for the utterance")]
    EmptyEmbedding,
}

/// Turns utterances into ranked intents using the lifecycle's model and
/// example cache.
pub struct IntentRecognizer {
    lifecycle: Arc<ModelLifecycle>,
    extractor: Arc<dyn EntityExtractor>,
    last_result: RwLock<Option<Arc<IntentRecognitionResult>>>,
}

impl IntentRecognizer {
    /// Recognizer with the regex entity extractor.
    pub fn new(lifecycle: Arc<ModelLifecycle>) -> Self {
        Self::with_extractor(lifecycle, Arc::new(PatternEntityExtractor::new()))
    }

    pub fn with_extractor(
        lifecycle: Arc<ModelLifecycle>,
        extractor: Arc<dyn EntityExtractor>,
    ) -> Self {
        Self {
            lifecycle,
            extractor,
            last_result: RwLock::new(None),
        }
    }

    pub fn lifecycle(&self) -> &Arc<ModelLifecycle> {
        &self.lifecycle
    }

    /// Most recent result produced by `recognize`.
    pub fn last_result(&self) -> Option<Arc<IntentRecognitionResult>> {
        self.last_result.read().unwrap().clone()
    }

    /// Rank every catalogue intent for `text` in `context`.
    ///
    /// Loads the model on first use. If it cannot be loaded the result is
    /// marked degraded and carries no intents; entities are still extracted.
    pub async fn recognize(
        &self,
        text: &str,
        context: &ApplicationContext,
    ) -> Result<IntentRecognitionResult, RecognitionError> {
        let entities = self.extractor.extract(text, context);

        let model = match self.lifecycle.loaded() {
            Some(model) => model,
            None => {
                let ok = self.lifecycle.ensure_loaded().await;
                match self.lifecycle.loaded() {
                    Some(model) if ok => model,
                    _ => {
                        warn!(status = %self.lifecycle.status(), "model unavailable, returning degraded result");
                        let result =
                            IntentRecognitionResult::degraded(text, entities, context.clone());
                        self.remember(&result);
                        return Ok(result);
                    }
                }
            }
        };

        let mut vectors = model.embedder.embed_batch(&[text]).await?;
        if vectors.is_empty() {
            return Err(RecognitionError::EmptyEmbedding);
        }
        let input = vectors.swap_remove(0);

        let intents = rank_intents(&input, self.lifecycle.catalogue(), &model.cache, context);
        let result = IntentRecognitionResult::new(text, intents, entities, context.clone());
        if let Some(top) = &result.top_intent {
            debug!(
                intent = %top.intent,
                score = top.score,
                relevance = top.context_relevance,
                combined = top.combined_score,
                "top intent"
            );
        }

        self.remember(&result);
        self.lifecycle.touch_if_due().await;
        Ok(result)
    }

    fn remember(&self, result: &IntentRecognitionResult) {
        *self.last_result.write().unwrap() = Some(Arc::new(result.clone()));
    }
}
