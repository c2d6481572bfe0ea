use std::sync::Arc;

use crate::config::Config;
use crate::corpus::ResumeDatabase;
use crate::embedding::Embedder;
use crate::screening::uploads::UploadStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Sentence embedder, loaded once at startup and shared by every request.
    pub embedder: Arc<dyn Embedder>,
    /// CSV resume corpus. Searches return nothing until its index is published.
    pub corpus: Arc<ResumeDatabase>,
    pub uploads: UploadStore,
}

impl AppState {
    pub fn new(config: Config, embedder: Arc<dyn Embedder>) -> Self {
        let corpus = Arc::new(ResumeDatabase::new(&config));
        let uploads = UploadStore::new(config.uploads_dir.clone());
        Self {
            config,
            embedder,
            corpus,
            uploads,
        }
    }
}
