pub mod config;
pub mod db;
pub mod embeddings;
pub mod error;
pub mod generation;
pub mod models;
pub mod text;

pub use config::ResurfConfig;
pub use embeddings::{
    EmbeddingBackend, EmbeddingConfig, EmbeddingError, GeminiEmbeddingClient,
    SoftEmbeddingClient, EMBEDDING_DIMENSIONS, MAX_EMBED_CHARS, MIN_EMBED_CHARS,
};
pub use error::{ResurfError, StoreError};
pub use generation::{GeminiGenerationClient, GenerationConfig, GenerationError};
pub use models::{Intent, Save};
