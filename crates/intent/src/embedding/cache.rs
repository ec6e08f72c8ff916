use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use super::traits::{Embedder, EmbeddingError};
use crate::catalogue::IntentCatalogue;

/// Precomputed example embeddings keyed by the exact example text.
///
/// Built once per model load and dropped on unload; there is no eviction, so
/// after `populate` every catalogue example has an entry.
#[derive(Debug, Default)]
pub struct EmbeddingCache {
    entries: HashMap<String, Vec<f32>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl EmbeddingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Embed every unique catalogue example in a single batch call.
    pub async fn populate(
        embedder: &dyn Embedder,
        catalogue: &IntentCatalogue,
    ) -> Result<Self, EmbeddingError> {
        let texts = catalogue.unique_examples();
        let mut cache = Self::new();
        if texts.is_empty() {
            return Ok(cache);
        }

        let vectors = embedder.embed_batch(&texts).await?;
        if vectors.len() != texts.len() {
            return Err(EmbeddingError::BatchSizeMismatch {
                sent: texts.len(),
                received: vectors.len(),
            });
        }

        cache.entries.reserve(texts.len());
        for (text, vector) in texts.into_iter().zip(vectors) {
            cache.entries.insert(text.to_string(), vector);
        }
        debug!(entries = cache.len(), "example embedding cache populated");
        Ok(cache)
    }

    /// Look up a cached embedding by example text.
    pub fn get(&self, text: &str) -> Option<&[f32]> {
        match self.entries.get(text) {
            Some(vec) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(vec.as_slice())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn contains(&self, text: &str) -> bool {
        self.entries.contains_key(text)
    }

    /// Store an embedding for a text.
    pub fn insert(&mut self, text: impl Into<String>, embedding: Vec<f32>) {
        self.entries.insert(text.into(), embedding);
    }

    pub fn remove(&mut self, text: &str) -> Option<Vec<f32>> {
        self.entries.remove(text)
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits();
        let total = hits + self.misses();
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
