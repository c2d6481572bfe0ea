// Sentence embeddings for job descriptions and resumes.
// Every caller goes through the `Embedder` trait; the BERT engine is one implementation.

pub mod engine;
pub mod similarity;

use async_trait::async_trait;
use thiserror::Error;

pub use engine::BertEmbedder;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("failed to load embedding model: {0}")]
    Load(String),

    #[error("tokenization failed: {0}")]
    Tokenization(String),

    #[error("tensor error: {0}")]
    Candle(#[from] candle_core::Error),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("embedding task aborted: {0}")]
    Task(String),
}

/// Produces one dense vector per input text.
///
/// Carried in `AppState` as `Arc<dyn Embedder>` so tests can swap in a
/// deterministic implementation without a model download.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Embeds a single text.
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.embed(vec![text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| EmbeddingError::Inference("model returned no embedding".to_string()))
    }

    fn dimension(&self) -> usize;

    fn model_id(&self) -> &str;
}
