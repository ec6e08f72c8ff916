//! Loading progress of the embedding model.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a loaded model came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelOrigin {
    Cache,
    Remote,
}

impl fmt::Display for ModelOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelOrigin::Cache => write!(f, "cache"),
            ModelOrigin::Remote => write!(f, "remote"),
        }
    }
}

/// Why a load attempt ended in [`ModelStatus::Failed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum LoadFailure {
    /// No network and no usable local copy.
    Offline,
    Backend(String),
    Fetch(String),
    Embeddings(String),
}

impl fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadFailure::Offline => {
                write!(f, "You appear to be offline and no cached model is available")
            }
            LoadFailure::Backend(e) => write!(f, "Failed to initialise the model backend: {e}"),
            LoadFailure::Fetch(e) => write!(f, "Failed to load the model: {e}"),
            LoadFailure::Embeddings(e) => write!(f, "Failed to prepare example embeddings: {e}"),
        }
    }
}

/// Lifecycle state of the embedding model. Progress and message are derived
/// from the variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ModelStatus {
    NotStarted,
    Initializing,
    LoadingFromCache,
    LoadingFromServer,
    PreparingEmbeddings { examples: usize },
    Ready { origin: ModelOrigin },
    Failed { reason: LoadFailure },
    Unloaded,
}

impl ModelStatus {
    pub fn percent(&self) -> u8 {
        match self {
            ModelStatus::NotStarted => 0,
            ModelStatus::Initializing => 10,
            ModelStatus::LoadingFromCache => 25,
            ModelStatus::LoadingFromServer => 40,
            ModelStatus::PreparingEmbeddings { .. } => 70,
            ModelStatus::Ready { .. } => 100,
            ModelStatus::Failed { .. } => 0,
            ModelStatus::Unloaded => 0,
        }
    }

    pub fn message(&self) -> String {
        self.to_string()
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ModelStatus::Ready { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ModelStatus::Failed { .. })
    }

    /// A load is running.
    pub fn is_loading(&self) -> bool {
        matches!(
            self,
            ModelStatus::Initializing
                | ModelStatus::LoadingFromCache
                | ModelStatus::LoadingFromServer
                | ModelStatus::PreparingEmbeddings { .. }
        )
    }
}

impl fmt::Display for ModelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelStatus::NotStarted => write!(f, "Model not loaded"),
            ModelStatus::Initializing => write!(f, "Initializing model backend"),
            ModelStatus::LoadingFromCache => write!(f, "Loading model from local cache"),
            ModelStatus::LoadingFromServer => write!(f, "Downloading model"),
            ModelStatus::PreparingEmbeddings { examples } => {
                write!(f, "Preparing embeddings for {examples} examples")
            }
            ModelStatus::Ready { origin } => write!(f, "Model ready (loaded from {origin})"),
            ModelStatus::Failed { reason } => write!(f, "{reason}"),
            ModelStatus::Unloaded => write!(f, "Model unloaded"),
        }
    }
}
