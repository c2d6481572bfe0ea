// CSV resume corpus: loading, embedding, persistence and search.

mod database;
mod loader;

pub use database::ResumeDatabase;

use thiserror::Error;

use crate::embedding::EmbeddingError;
use crate::index::IndexError;

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("index error: {0}")]
    Index(#[from] IndexError),

    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("persisted index holds {vectors} vectors but {records} metadata records")]
    MetadataMismatch { vectors: usize, records: usize },

    #[error("persisted index has dimension {index} but the embedder produces {model}")]
    DimensionMismatch { index: usize, model: usize },

    #[error("corpus task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
