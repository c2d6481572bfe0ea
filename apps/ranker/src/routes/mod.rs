pub mod health;
pub mod pages;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;

use crate::screening::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let static_dir = state.config.static_dir.clone();
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(pages::home_handler))
        .route("/health", get(health::health_handler))
        // Screening API
        .route("/api/screen-resumes", post(handlers::handle_screen_resumes))
        .route("/download/:filename", get(handlers::handle_download))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
