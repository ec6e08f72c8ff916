use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::debug;

use super::traits::{Embedder, EmbeddingError};

/// Debug instrumentation around another embedder: logs every batch with its
/// size, output width and latency.
pub struct TracedEmbedder {
    inner: Arc<dyn Embedder>,
}

impl TracedEmbedder {
    pub fn new(inner: Arc<dyn Embedder>) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &Arc<dyn Embedder> {
        &self.inner
    }
}

#[async_trait]
impl Embedder for TracedEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let started = Instant::now();
        let result = self.inner.embed_batch(texts).await;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        match &result {
            Ok(vectors) => debug!(
                embedder = self.inner.name(),
                batch = texts.len(),
                dims = vectors.first().map(|v| v.len()).unwrap_or(0),
                elapsed_ms,
                "embedded batch"
            ),
            Err(e) => debug!(
                embedder = self.inner.name(),
                batch = texts.len(),
                elapsed_ms,
                error = %e,
                "batch embedding failed"
            ),
        }
        result
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashingEmbedder;

    #[tokio::test]
    async fn passes_results_through() {
        let inner: Arc<dyn Embedder> = Arc::new(HashingEmbedder::new(8));
        let traced = TracedEmbedder::new(inner.clone());
        let a = traced.embed_batch(&["hello there"]).await.unwrap();
        let b = inner.embed_batch(&["hello there"]).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(traced.name(), "hashing");
        assert_eq!(traced.dimensions(), 8);
    }
}
