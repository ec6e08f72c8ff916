//! Where the embedding model comes from: a local cached copy or the
//! authoritative (remote) source.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thea_core::config::EmbeddingConfig;
use thiserror::Error;
use tracing::{debug, info};

use crate::embedding::{Embedder, EmbeddingError, HashingEmbedder, OllamaEmbedder, OpenAiEmbedder};

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("backend unavailable: {0}")]
    Backend(String),

    #[error("no cached model")]
    NotCached,

    #[error("cached model is corrupt: {0}")]
    Corrupt(String),

    #[error("model fetch failed: {0}")]
    Fetch(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),
}

/// Loads the sentence encoder used for recognition.
#[async_trait]
pub trait ModelSource: Send + Sync {
    /// Prepare whatever runtime the model needs. Runs before every load.
    async fn prepare_backend(&self) -> Result<(), ModelError> {
        Ok(())
    }

    /// Materialise the model from the local cache.
    async fn load_local(&self) -> Result<Arc<dyn Embedder>, ModelError>;

    /// Fetch the model from its remote source.
    async fn load_remote(&self) -> Result<Arc<dyn Embedder>, ModelError>;

    /// Keep a local copy of a freshly fetched model.
    async fn save_local(&self, _embedder: &Arc<dyn Embedder>) -> Result<(), ModelError> {
        Ok(())
    }

    /// Drop the local copy (e.g. after it failed to load).
    async fn remove_cached(&self) -> Result<(), ModelError>;

    fn name(&self) -> &str;
}

/// Resolved description of a backend, persisted as the local model copy.
/// Never contains credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelManifest {
    pub provider: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub dimensions: usize,
}

const MANIFEST_FILE: &str = "model-manifest.json";

/// Builds the configured embedding provider (`hashing`, `ollama`, `openai`).
///
/// The remote path constructs the backend and probes it with a one-item
/// batch. The local path rebuilds it from the manifest written by
/// `save_local`, without probing.
pub struct ProviderModelSource {
    config: EmbeddingConfig,
    cache_dir: PathBuf,
}

impl ProviderModelSource {
    pub fn new(config: EmbeddingConfig, cache_dir: &Path) -> Self {
        Self {
            config,
            cache_dir: cache_dir.to_path_buf(),
        }
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.cache_dir.join(MANIFEST_FILE)
    }

    fn manifest(&self) -> ModelManifest {
        let url = match self.config.provider.as_str() {
            "ollama" => Some(self.config.ollama_url.clone()),
            "openai" => self.config.openai_base_url.clone(),
            _ => None,
        };
        ModelManifest {
            provider: self.config.provider.clone(),
            model: self.config.model.clone(),
            url,
            dimensions: self.config.dimensions as usize,
        }
    }

    fn build(&self, manifest: &ModelManifest) -> Result<Arc<dyn Embedder>, ModelError> {
        let embedder: Arc<dyn Embedder> = match manifest.provider.as_str() {
            "hashing" => Arc::new(HashingEmbedder::new(manifest.dimensions)),
            "ollama" => Arc::new(OllamaEmbedder::new(
                manifest
                    .url
                    .clone()
                    .unwrap_or_else(|| self.config.ollama_url.clone()),
                manifest.model.clone(),
                manifest.dimensions,
            )),
            "openai" => {
                let key = self.config.openai_api_key.clone().ok_or_else(|| {
                    ModelError::Backend("OPENAI_API_KEY is not set".to_string())
                })?;
                Arc::new(OpenAiEmbedder::new(
                    key,
                    manifest.model.clone(),
                    manifest.url.clone(),
                    manifest.dimensions,
                ))
            }
            other => {
                return Err(ModelError::Backend(format!(
                    "unknown embedding provider '{other}'"
                )))
            }
        };
        Ok(embedder)
    }
}

#[async_trait]
impl ModelSource for ProviderModelSource {
    async fn prepare_backend(&self) -> Result<(), ModelError> {
        if !self.config.is_configured() {
            return Err(ModelError::Backend(format!(
                "embedding provider '{}' is not configured",
                self.config.provider
            )));
        }
        Ok(())
    }

    async fn load_local(&self) -> Result<Arc<dyn Embedder>, ModelError> {
        let path = self.manifest_path();
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(ModelError::NotCached),
            Err(e) => return Err(e.into()),
        };
        let manifest: ModelManifest =
            serde_json::from_slice(&bytes).map_err(|e| ModelError::Corrupt(e.to_string()))?;
        if manifest.provider != self.config.provider {
            return Err(ModelError::Corrupt(format!(
                "manifest is for provider '{}', configured '{}'",
                manifest.provider, self.config.provider
            )));
        }
        debug!(path = %path.display(), model = %manifest.model, "model manifest loaded");
        self.build(&manifest)
    }

    async fn load_remote(&self) -> Result<Arc<dyn Embedder>, ModelError> {
        let manifest = self.manifest();
        let embedder = self.build(&manifest)?;
        let probe = embedder
            .embed_batch(&["ping"])
            .await
            .map_err(|e| ModelError::Fetch(e.to_string()))?;
        match probe.first() {
            Some(v) if v.len() == manifest.dimensions => {}
            Some(v) => {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: manifest.dimensions,
                    actual: v.len(),
                }
                .into())
            }
            None => return Err(ModelError::Fetch("probe returned no vectors".to_string())),
        }
        info!(provider = %manifest.provider, model = %manifest.model, "embedding backend reachable");
        Ok(embedder)
    }

    async fn save_local(&self, _embedder: &Arc<dyn Embedder>) -> Result<(), ModelError> {
        tokio::fs::create_dir_all(&self.cache_dir).await?;
        let json = serde_json::to_vec_pretty(&self.manifest())?;
        tokio::fs::write(self.manifest_path(), json).await?;
        Ok(())
    }

    async fn remove_cached(&self) -> Result<(), ModelError> {
        match tokio::fs::remove_file(self.manifest_path()).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn name(&self) -> &str {
        &self.config.provider
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hashing_config(dims: u32) -> EmbeddingConfig {
        EmbeddingConfig {
            dimensions: dims,
            ..EmbeddingConfig::default()
        }
    }

    #[tokio::test]
    async fn remote_then_local_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let source = ProviderModelSource::new(hashing_config(64), dir.path());

        assert!(matches!(source.load_local().await, Err(ModelError::NotCached)));

        let embedder = source.load_remote().await.unwrap();
        assert_eq!(embedder.dimensions(), 64);
        source.save_local(&embedder).await.unwrap();

        let local = source.load_local().await.unwrap();
        assert_eq!(local.name(), "hashing");
        assert_eq!(local.dimensions(), 64);

        source.remove_cached().await.unwrap();
        assert!(matches!(source.load_local().await, Err(ModelError::NotCached)));
    }

    #[tokio::test]
    async fn corrupt_manifest_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let source = ProviderModelSource::new(hashing_config(8), dir.path());
        std::fs::write(source.manifest_path(), b"garbage").unwrap();
        assert!(matches!(source.load_local().await, Err(ModelError::Corrupt(_))));
    }

    #[tokio::test]
    async fn manifest_never_stores_api_key() {
        let dir = tempfile::tempdir().unwrap();
        let config = EmbeddingConfig {
            provider: "openai".to_string(),
            openai_api_key: Some("sk-secret".to_string()),
            ..EmbeddingConfig::default()
        };
        let source = ProviderModelSource::new(config, dir.path());
        let embedder: Arc<dyn Embedder> = Arc::new(HashingEmbedder::new(4));
        source.save_local(&embedder).await.unwrap();
        let raw = std::fs::read_to_string(source.manifest_path()).unwrap();
        assert!(!raw.contains("sk-secret"));
    }

    #[tokio::test]
    async fn unconfigured_provider_fails_backend_step() {
        let dir = tempfile::tempdir().unwrap();
        let config = EmbeddingConfig {
            provider: "openai".to_string(),
            ..EmbeddingConfig::default()
        };
        let source = ProviderModelSource::new(config, dir.path());
        assert!(matches!(source.prepare_backend().await, Err(ModelError::Backend(_))));
    }
}
