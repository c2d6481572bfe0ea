use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use serde::Serialize;
use tracing::{error, info, warn};

use super::loader::{load_records, ResumeRecord};
use super::CorpusError;
use crate::config::Config;
use crate::embedding::similarity::l2_normalize;
use crate::embedding::Embedder;
use crate::index::{read_bincode, write_bincode, FlatIndex};

/// A corpus resume returned from a search, with its clamped cosine score.
#[derive(Debug, Clone)]
pub struct DatabaseHit {
    pub record: ResumeRecord,
    pub score: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CorpusState {
    Building,
    Ready,
    Unavailable,
}

#[derive(Debug, Clone, Serialize)]
pub struct CorpusStatus {
    pub state: CorpusState,
    pub resumes: usize,
}

struct LoadedCorpus {
    index: FlatIndex,
    metadata: Vec<ResumeRecord>,
}

/// Searchable resume corpus backed by a CSV file and a persisted flat index.
///
/// The loaded index is published once; until then searches return nothing.
pub struct ResumeDatabase {
    csv_path: PathBuf,
    index_path: PathBuf,
    metadata_path: PathBuf,
    batch_size: usize,
    loaded: OnceLock<LoadedCorpus>,
    building: AtomicBool,
}

impl ResumeDatabase {
    pub fn new(config: &Config) -> Self {
        Self {
            csv_path: config.csv_path.clone(),
            index_path: config.index_path.clone(),
            metadata_path: config.metadata_path.clone(),
            batch_size: config.embedding_batch_size.max(1),
            loaded: OnceLock::new(),
            building: AtomicBool::new(false),
        }
    }

    pub fn has_persisted_index(&self) -> bool {
        self.index_path.exists() && self.metadata_path.exists()
    }

    /// Loads a persisted index before returning, or schedules a build from
    /// the CSV on a background task when none exists yet.
    pub async fn start(self: &Arc<Self>, embedder: Arc<dyn Embedder>) {
        if self.has_persisted_index() {
            if let Err(e) = self.build_index(embedder.as_ref()).await {
                warn!("CSV database initialization failed: {e}");
            }
            return;
        }

        info!("CSV index not found. Building in background...");
        let database = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = database.build_index(embedder.as_ref()).await {
                warn!("CSV database initialization failed: {e}");
            }
        });
    }

    /// Loads the persisted index if present, otherwise embeds the CSV corpus
    /// and persists the result. Returns the number of indexed resumes.
    ///
    /// A missing CSV or an unreadable persisted index leaves an empty corpus.
    pub async fn build_index(&self, embedder: &dyn Embedder) -> Result<usize, CorpusError> {
        if let Some(loaded) = self.loaded.get() {
            return Ok(loaded.metadata.len());
        }

        self.building.store(true, Ordering::SeqCst);
        // Publish before clearing `building` so status never dips to unavailable.
        let result = self.load_or_build(embedder).await.map(|corpus| {
            let count = corpus.metadata.len();
            // A concurrent build may have won; its result is equivalent.
            let _ = self.loaded.set(corpus);
            count
        });
        self.building.store(false, Ordering::SeqCst);
        result
    }

    async fn load_or_build(&self, embedder: &dyn Embedder) -> Result<LoadedCorpus, CorpusError> {
        let dimension = embedder.dimension();
        let empty = || -> Result<LoadedCorpus, CorpusError> {
            Ok(LoadedCorpus {
                index: FlatIndex::new(dimension)?,
                metadata: Vec::new(),
            })
        };

        if self.has_persisted_index() {
            info!("Loading existing index from {}", self.index_path.display());
            let index_path = self.index_path.clone();
            let metadata_path = self.metadata_path.clone();
            let loaded = tokio::task::spawn_blocking(move || {
                load_persisted(&index_path, &metadata_path, dimension)
            })
            .await?;

            return match loaded {
                Ok(corpus) => {
                    info!("Loaded index with {} resumes from disk", corpus.metadata.len());
                    Ok(corpus)
                }
                Err(e) => {
                    error!("Error loading index: {e}");
                    empty()
                }
            };
        }

        if !self.csv_path.exists() {
            warn!(
                "CSV file '{}' not found. Creating empty index.",
                self.csv_path.display()
            );
            return empty();
        }

        info!("Building index from {}", self.csv_path.display());
        let csv_path = self.csv_path.clone();
        let metadata = tokio::task::spawn_blocking(move || load_records(&csv_path)).await??;
        if metadata.is_empty() {
            warn!("No valid resume texts found in CSV");
            return empty();
        }

        let total = metadata.len();
        info!("Generating embeddings for {total} resumes...");

        let mut index = FlatIndex::new(dimension)?;
        let mut processed = 0;
        for batch in metadata.chunks(self.batch_size) {
            let texts = batch.iter().map(|r| r.full_text.clone()).collect();
            let mut vectors = embedder.embed(texts).await?;
            vectors.iter_mut().for_each(|v| l2_normalize(v));
            index.add(&vectors)?;

            processed += batch.len();
            info!("Processed {processed}/{total} resumes...");
        }

        let index_path = self.index_path.clone();
        let metadata_path = self.metadata_path.clone();
        let (corpus, saved) = tokio::task::spawn_blocking(move || {
            let corpus = LoadedCorpus { index, metadata };
            let saved = persist(&corpus, &index_path, &metadata_path);
            (corpus, saved)
        })
        .await?;

        match saved {
            Ok(()) => info!("Index saved to {}", self.index_path.display()),
            Err(e) => error!("Failed to save index to {}: {e}", self.index_path.display()),
        }

        info!("Index built successfully with {total} resumes");
        Ok(corpus)
    }

    pub fn is_ready(&self) -> bool {
        self.loaded.get().is_some()
    }

    /// Number of indexed resumes; zero until ready.
    pub fn len(&self) -> usize {
        self.loaded.get().map_or(0, |c| c.metadata.len())
    }

    pub fn status(&self) -> CorpusStatus {
        let state = if self.is_ready() {
            CorpusState::Ready
        } else if self.building.load(Ordering::SeqCst) {
            CorpusState::Building
        } else {
            CorpusState::Unavailable
        };
        CorpusStatus {
            state,
            resumes: self.len(),
        }
    }

    /// Top `top_k` resumes by cosine similarity to `query`.
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<DatabaseHit>, CorpusError> {
        let Some(corpus) = self.loaded.get() else {
            return Ok(Vec::new());
        };
        if corpus.metadata.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = query.to_vec();
        l2_normalize(&mut query);

        let k = top_k.min(corpus.metadata.len());
        let hits = corpus.index.search(&query, k)?;

        Ok(hits
            .into_iter()
            .filter_map(|hit| {
                corpus.metadata.get(hit.position).map(|record| DatabaseHit {
                    record: record.clone(),
                    score: hit.score.clamp(0.0, 1.0),
                })
            })
            .collect())
    }
}

/// Reads a persisted index and its metadata, rejecting pairs that disagree
/// with each other or with the embedder's output size.
fn load_persisted(
    index_path: &Path,
    metadata_path: &Path,
    dimension: usize,
) -> Result<LoadedCorpus, CorpusError> {
    let index = FlatIndex::load(index_path)?;
    if index.dimension() != dimension {
        return Err(CorpusError::DimensionMismatch {
            index: index.dimension(),
            model: dimension,
        });
    }
    let metadata: Vec<ResumeRecord> = read_bincode(metadata_path)?;
    if index.len() != metadata.len() {
        return Err(CorpusError::MetadataMismatch {
            vectors: index.len(),
            records: metadata.len(),
        });
    }
    Ok(LoadedCorpus { index, metadata })
}

fn persist(
    corpus: &LoadedCorpus,
    index_path: &Path,
    metadata_path: &Path,
) -> Result<(), CorpusError> {
    corpus.index.save(index_path)?;
    write_bincode(&corpus.metadata, metadata_path)?;
    Ok(())
}
