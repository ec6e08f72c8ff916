//! Persisted metadata about the locally cached model.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::status::ModelOrigin;

/// Key the metadata record is stored under.
pub const METADATA_KEY: &str = "thea.model-cache";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheMetadata {
    /// When the model was last loaded.
    pub date: DateTime<Utc>,
    pub version: String,
    pub source: ModelOrigin,
    pub last_used: DateTime<Utc>,
}

impl CacheMetadata {
    pub fn new(version: impl Into<String>, source: ModelOrigin) -> Self {
        let now = Utc::now();
        Self {
            date: now,
            version: version.into(),
            source,
            last_used: now,
        }
    }

    pub fn touched(mut self) -> Self {
        self.last_used = Utc::now();
        self
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Key-value style storage for [`CacheMetadata`].
#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn read(&self) -> Result<Option<CacheMetadata>, StoreError>;

    async fn write(&self, metadata: &CacheMetadata) -> Result<(), StoreError>;

    async fn clear(&self) -> Result<(), StoreError>;
}

/// Stores the record as `<dir>/thea.model-cache.json`.
pub struct JsonFileMetadataStore {
    path: PathBuf,
}

impl JsonFileMetadataStore {
    pub fn new(dir: &Path) -> Self {
        Self {
            path: dir.join(format!("{METADATA_KEY}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl MetadataStore for JsonFileMetadataStore {
    async fn read(&self) -> Result<Option<CacheMetadata>, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, metadata: &CacheMetadata) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(metadata)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Process-local store, for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct InMemoryMetadataStore {
    record: Mutex<Option<CacheMetadata>>,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(metadata: CacheMetadata) -> Self {
        Self {
            record: Mutex::new(Some(metadata)),
        }
    }

    pub fn snapshot(&self) -> Option<CacheMetadata> {
        self.record.lock().unwrap().clone()
    }
}

#[async_trait]
impl MetadataStore for InMemoryMetadataStore {
    async fn read(&self) -> Result<Option<CacheMetadata>, StoreError> {
        Ok(self.snapshot())
    }

    async fn write(&self, metadata: &CacheMetadata) -> Result<(), StoreError> {
        *self.record.lock().unwrap() = Some(metadata.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        *self.record.lock().unwrap() = None;
        Ok(())
    }
}
