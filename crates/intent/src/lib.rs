pub mod catalogue;
pub mod embedding;
pub mod entities;
pub mod lifecycle;
pub mod recognizer;
pub mod relevance;
pub mod result;
pub mod scoring;
pub mod similarity;

pub use catalogue::{CatalogueError, ContextRelevanceRule, Intent, IntentCatalogue};
pub use embedding::{Embedder, EmbeddingCache, EmbeddingError, HashingEmbedder};
pub use entities::{EntityExtractor, NoEntities, PatternEntityExtractor};
pub use lifecycle::{
    LifecycleSettings, LoadFailure, ModelLifecycle, ModelOrigin, ModelSource, ModelStatus,
};
pub use recognizer::{IntentRecognizer, RecognitionError};
pub use result::{IntentMatch, IntentRecognitionResult};
