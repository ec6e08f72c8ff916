pub mod cache;
pub mod hashing;
pub mod ollama;
pub mod openai;
pub mod traced;
pub mod traits;

pub use cache::EmbeddingCache;
pub use hashing::HashingEmbedder;
pub use ollama::OllamaEmbedder;
pub use openai::OpenAiEmbedder;
pub use traced::TracedEmbedder;
pub use traits::{Embedder, EmbeddingError};
