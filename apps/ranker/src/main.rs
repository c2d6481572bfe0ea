mod config;
mod corpus;
mod embedding;
mod errors;
mod index;
mod routes;
mod screening;
mod state;
mod text;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::embedding::{BertEmbedder, Embedder};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume Ranker v{}", env!("CARGO_PKG_VERSION"));

    // Load the sentence embedder (downloads weights on first run)
    let model_id = config.model_id.clone();
    let embedder: Arc<dyn Embedder> = Arc::new(
        tokio::task::spawn_blocking(move || BertEmbedder::load(&model_id))
            .await
            .context("embedder loader task panicked")??,
    );
    info!(
        "Embedder ready (model: {}, dim: {})",
        embedder.model_id(),
        embedder.dimension()
    );

    let state = AppState::new(config.clone(), embedder.clone());
    state
        .uploads
        .ensure_dir()
        .await
        .with_context(|| format!("creating {}", state.uploads.dir().display()))?;
    info!("Uploads stored in {}", state.uploads.dir().display());

    // Loads a persisted index now, otherwise builds it in the background
    state.corpus.start(embedder).await;

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
