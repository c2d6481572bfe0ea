use std::cmp::Ordering;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::embedding::similarity::dot;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("dimension mismatch: index has {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("index dimension must be non-zero")]
    ZeroDimension,

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One search result: inner-product score and the row position in the index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub score: f32,
    pub position: usize,
}

/// Exact inner-product index over fixed-dimension vectors.
///
/// Callers that want cosine similarity L2-normalize both the stored vectors
/// and the query before using it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatIndex {
    dimension: usize,
    vectors: Vec<f32>,
}

impl FlatIndex {
    pub fn new(dimension: usize) -> Result<Self, IndexError> {
        if dimension == 0 {
            return Err(IndexError::ZeroDimension);
        }
        Ok(Self {
            dimension,
            vectors: Vec::new(),
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of stored vectors.
    pub fn len(&self) -> usize {
        self.vectors.len() / self.dimension
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Appends vectors in order. Nothing is added if any vector has the wrong dimension.
    pub fn add<V: AsRef<[f32]>>(&mut self, vectors: &[V]) -> Result<(), IndexError> {
        if let Some(bad) = vectors.iter().find(|v| v.as_ref().len() != self.dimension) {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: bad.as_ref().len(),
            });
        }
        self.vectors.reserve(vectors.len() * self.dimension);
        for v in vectors {
            self.vectors.extend_from_slice(v.as_ref());
        }
        Ok(())
    }

    /// Returns up to `k` hits ordered by descending score. Ties keep insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Hit>, IndexError> {
        if query.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let mut hits: Vec<Hit> = self
            .vectors
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(position, row)| Hit {
                score: dot(query, row),
                position,
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then(a.position.cmp(&b.position))
        });
        hits.truncate(k);
        Ok(hits)
    }

    pub fn save(&self, path: &Path) -> Result<(), IndexError> {
        super::write_bincode(self, path)
    }

    pub fn load(path: &Path) -> Result<Self, IndexError> {
        let index: FlatIndex = super::read_bincode(path)?;
        if index.dimension == 0 {
            return Err(IndexError::ZeroDimension);
        }
        if index.vectors.len() % index.dimension != 0 {
            return Err(IndexError::Serialization(format!(
                "{} values is not a multiple of dimension {}",
                index.vectors.len(),
                index.dimension
            )));
        }
        Ok(index)
    }
}
