//! Shared fakes for the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use thea_intent::embedding::{Embedder, EmbeddingError, HashingEmbedder};
use thea_intent::lifecycle::{
    Connectivity, InMemoryMetadataStore, LifecycleSettings, MetadataStore, ModelError,
    ModelLifecycle, ModelSource, StaticConnectivity,
};
use thea_intent::IntentCatalogue;

pub const DIMS: usize = 256;

/// Hashing embedder that counts batches and can be told to misbehave on
/// single-text batches (i.e. utterances, not catalogue population).
pub struct CountingEmbedder {
    inner: HashingEmbedder,
    pub batches: AtomicUsize,
    pub utterance_mode: UtteranceMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UtteranceMode {
    Normal,
    Fail,
    Empty,
}

impl CountingEmbedder {
    pub fn new(utterance_mode: UtteranceMode) -> Self {
        Self {
            inner: HashingEmbedder::new(DIMS),
            batches: AtomicUsize::new(0),
            utterance_mode,
        }
    }

    pub fn batches(&self) -> usize {
        self.batches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for CountingEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.batches.fetch_add(1, Ordering::SeqCst);
        if texts.len() == 1 {
            match self.utterance_mode {
                UtteranceMode::Normal => {}
                UtteranceMode::Fail => {
                    return Err(EmbeddingError::Api("embedding service exploded".into()))
                }
                UtteranceMode::Empty => return Ok(Vec::new()),
            }
        }
        self.inner.embed_batch(texts).await
    }

    fn dimensions(&self) -> usize {
        DIMS
    }

    fn name(&self) -> &str {
        "counting"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalCopy {
    Missing,
    Corrupt,
    Valid,
}

/// Model source with call counters and configurable failures.
pub struct FakeSource {
    pub embedder: Arc<CountingEmbedder>,
    pub local: LocalCopy,
    pub remote_fails: bool,
    pub backend_fails: bool,
    pub remote_delay: Duration,
    pub prepare_calls: AtomicUsize,
    pub local_calls: AtomicUsize,
    pub remote_calls: AtomicUsize,
    pub save_calls: AtomicUsize,
    pub remove_calls: AtomicUsize,
}

impl FakeSource {
    pub fn new(local: LocalCopy) -> Self {
        Self::with_embedder(local, CountingEmbedder::new(UtteranceMode::Normal))
    }

    pub fn with_embedder(local: LocalCopy, embedder: CountingEmbedder) -> Self {
        Self {
            embedder: Arc::new(embedder),
            local,
            remote_fails: false,
            backend_fails: false,
            remote_delay: Duration::ZERO,
            prepare_calls: AtomicUsize::new(0),
            local_calls: AtomicUsize::new(0),
            remote_calls: AtomicUsize::new(0),
            save_calls: AtomicUsize::new(0),
            remove_calls: AtomicUsize::new(0),
        }
    }

    pub fn remote_failing(mut self) -> Self {
        self.remote_fails = true;
        self
    }

    pub fn backend_failing(mut self) -> Self {
        self.backend_fails = true;
        self
    }

    pub fn slow(mut self, delay: Duration) -> Self {
        self.remote_delay = delay;
        self
    }

    pub fn local_calls(&self) -> usize {
        self.local_calls.load(Ordering::SeqCst)
    }

    pub fn remote_calls(&self) -> usize {
        self.remote_calls.load(Ordering::SeqCst)
    }

    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    pub fn remove_calls(&self) -> usize {
        self.remove_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelSource for FakeSource {
    async fn prepare_backend(&self) -> Result<(), ModelError> {
        self.prepare_calls.fetch_add(1, Ordering::SeqCst);
        if self.backend_fails {
            return Err(ModelError::Backend("no accelerator".into()));
        }
        Ok(())
    }

    async fn load_local(&self) -> Result<Arc<dyn Embedder>, ModelError> {
        self.local_calls.fetch_add(1, Ordering::SeqCst);
        match self.local {
            LocalCopy::Missing => Err(ModelError::NotCached),
            LocalCopy::Corrupt => Err(ModelError::Corrupt("truncated weights".into())),
            LocalCopy::Valid => Ok(self.embedder.clone()),
        }
    }

    async fn load_remote(&self) -> Result<Arc<dyn Embedder>, ModelError> {
        self.remote_calls.fetch_add(1, Ordering::SeqCst);
        if !self.remote_delay.is_zero() {
            tokio::time::sleep(self.remote_delay).await;
        }
        if self.remote_fails {
            return Err(ModelError::Fetch("HTTP 503".into()));
        }
        Ok(self.embedder.clone())
    }

    async fn save_local(&self, _embedder: &Arc<dyn Embedder>) -> Result<(), ModelError> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn remove_cached(&self) -> Result<(), ModelError> {
        self.remove_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &str {
        "fake"
    }
}

pub struct Harness {
    pub source: Arc<FakeSource>,
    pub metadata: Arc<InMemoryMetadataStore>,
    pub connectivity: Arc<StaticConnectivity>,
    pub lifecycle: Arc<ModelLifecycle>,
}

pub fn harness(source: FakeSource) -> Harness {
    harness_with(source, InMemoryMetadataStore::new(), LifecycleSettings::default())
}

pub fn harness_with(
    source: FakeSource,
    metadata: InMemoryMetadataStore,
    settings: LifecycleSettings,
) -> Harness {
    let source = Arc::new(source);
    let metadata = Arc::new(metadata);
    let connectivity = Arc::new(StaticConnectivity::online());
    let catalogue = Arc::new(IntentCatalogue::bundled().unwrap());
    let lifecycle = Arc::new(ModelLifecycle::new(
        source.clone() as Arc<dyn ModelSource>,
        metadata.clone() as Arc<dyn MetadataStore>,
        connectivity.clone() as Arc<dyn Connectivity>,
        catalogue,
        settings,
    ));
    Harness {
        source,
        metadata,
        connectivity,
        lifecycle,
    }
}
