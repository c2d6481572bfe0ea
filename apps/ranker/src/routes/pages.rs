use axum::{extract::State, response::Html};

use crate::errors::AppError;
use crate::state::AppState;

/// GET /
/// Serves the browser client's `index.html` from the templates directory.
pub async fn home_handler(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let path = state.config.templates_dir.join("index.html");
    match tokio::fs::read_to_string(&path).await {
        Ok(page) => Ok(Html(page)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(AppError::NotFound("index.html not found".to_string()))
        }
        Err(e) => Err(e.into()),
    }
}
