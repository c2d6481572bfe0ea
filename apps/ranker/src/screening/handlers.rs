//! Axum route handlers for the Screening API.

use axum::{
    extract::{multipart::Field, Multipart, Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use tracing::debug;

use crate::errors::AppError;
use crate::screening::pipeline::{
    screen_resumes, ScreenRequest, ScreenResponse, UploadedFile, DEFAULT_THRESHOLD,
};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/screen-resumes
///
/// Multipart form: `job_description` (required), `files` (any number of PDFs),
/// `threshold` (default 70.0), `include_csv` (default true).
pub async fn handle_screen_resumes(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ScreenResponse>, AppError> {
    let request = read_screen_form(multipart).await?;
    let response = screen_resumes(&state, request).await?;
    Ok(Json(response))
}

/// GET /download/:filename
///
/// Streams back a resume uploaded by an earlier screening request.
pub async fn handle_download(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    let path = state.uploads.resolve(&filename)?;

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::NotFound("File not found".to_string()))
        }
        Err(e) => return Err(e.into()),
    };

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}

// ────────────────────────────────────────────────────────────────────────────
// Form parsing
// ────────────────────────────────────────────────────────────────────────────

async fn read_screen_form(mut multipart: Multipart) -> Result<ScreenRequest, AppError> {
    let mut job_description = None;
    let mut files = Vec::new();
    let mut threshold = DEFAULT_THRESHOLD;
    let mut include_csv = true;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed form data: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "job_description" => job_description = Some(field_text(field).await?),
            "files" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;
                files.push(UploadedFile { filename, content });
            }
            "threshold" => threshold = parse_threshold(&field_text(field).await?)?,
            "include_csv" => include_csv = parse_bool(&field_text(field).await?)?,
            other => debug!("Ignoring unknown form field '{other}'"),
        }
    }

    let job_description = job_description
        .ok_or_else(|| AppError::Validation("job_description is required".to_string()))?;

    Ok(ScreenRequest {
        job_description,
        files,
        threshold,
        include_csv,
    })
}

async fn field_text(field: Field<'_>) -> Result<String, AppError> {
    let name = field.name().unwrap_or_default().to_string();
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid value for '{name}': {e}")))
}

fn parse_threshold(raw: &str) -> Result<f64, AppError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|t| t.is_finite())
        .ok_or_else(|| AppError::Validation(format!("threshold must be a number, got '{raw}'")))
}

/// Form booleans as browsers and HTML checkboxes send them.
fn parse_bool(raw: &str) -> Result<bool, AppError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "t" | "y" => Ok(true),
        "false" | "0" | "no" | "off" | "f" | "n" => Ok(false),
        _ => Err(AppError::Validation(format!(
            "include_csv must be a boolean, got '{raw}'"
        ))),
    }
}
