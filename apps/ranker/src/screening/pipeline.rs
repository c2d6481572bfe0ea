//! Screening pipeline: JD embedding -> per-source similarity -> threshold -> ranking.

use std::path::PathBuf;
use std::time::Instant;

use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, error, info, warn, Instrument};
use uuid::Uuid;

use crate::embedding::similarity::{cosine_similarity, format_score, round_to};
use crate::errors::AppError;
use crate::screening::ranking::{
    assign_ranks, csv_candidate_name, passes_threshold, pdf_candidate_name, CandidateResult,
    ResultSource,
};
use crate::screening::uploads::sanitize_filename;
use crate::state::AppState;
use crate::text::{extract_skills, pdf, preprocess};

pub const DEFAULT_THRESHOLD: f64 = 70.0;

/// Extracted text shorter than this (trimmed) is treated as unusable.
const MIN_TEXT_CHARS: usize = 20;
/// Extracted text shorter than this (trimmed) is flagged as a likely scan.
const SHORT_TEXT_CHARS: usize = 50;
const SHORT_TEXT_WARNING: &str = "Scanned/Empty PDF detected";

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content: Bytes,
}

#[derive(Debug, Clone)]
pub struct ScreenRequest {
    pub job_description: String,
    pub files: Vec<UploadedFile>,
    /// Minimum `match_score` (0–100) for a resume to be returned.
    pub threshold: f64,
    pub include_csv: bool,
}

#[cfg(test)]
impl ScreenRequest {
    pub fn new(job_description: impl Into<String>) -> Self {
        Self {
            job_description: job_description.into(),
            files: Vec::new(),
            threshold: DEFAULT_THRESHOLD,
            include_csv: true,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ScreenResponse {
    /// Resumes that were scored, before the threshold.
    pub total_processed: usize,
    /// Resumes returned across both lists.
    pub total_qualified: usize,
    pub processing_time_ms: f64,
    pub uploaded_results: Vec<CandidateResult>,
    pub database_results: Vec<CandidateResult>,
}

struct ParsedUpload {
    filename: String,
    text: String,
    skills: Vec<String>,
}

/// Runs the whole screening pipeline for one request.
///
/// Uploads saved during a request that later fails are deleted again.
pub async fn screen_resumes(
    state: &AppState,
    request: ScreenRequest,
) -> Result<ScreenResponse, AppError> {
    let started = Instant::now();

    if request.job_description.trim().is_empty() {
        return Err(AppError::Validation(
            "Job description cannot be empty".to_string(),
        ));
    }

    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("screen_resumes", %request_id);

    async move {
        let mut saved = Vec::new();
        let outcome = run_pipeline(state, &request, &mut saved).await;

        match outcome {
            Ok(mut response) => {
                response.processing_time_ms =
                    round_to(started.elapsed().as_secs_f64() * 1000.0, 1);
                info!(
                    uploaded = response.uploaded_results.len(),
                    database = response.database_results.len(),
                    elapsed_ms = response.processing_time_ms,
                    "Screening complete"
                );
                Ok(response)
            }
            Err(e) => {
                error!("Error in screen_resumes: {e}");
                state.uploads.remove_all(&saved).await;
                Err(e)
            }
        }
    }
    .instrument(span)
    .await
}

async fn run_pipeline(
    state: &AppState,
    request: &ScreenRequest,
    saved: &mut Vec<PathBuf>,
) -> Result<ScreenResponse, AppError> {
    let jd_embedding = state.embedder.embed_one(&request.job_description).await?;

    let mut total_processed = 0;

    // 1. Uploaded PDFs
    let parsed = parse_uploads(state, &request.files, saved).await;
    let mut uploaded_results = Vec::new();
    if !parsed.is_empty() {
        let texts = parsed.iter().map(|p| p.text.clone()).collect();
        let vectors = state.embedder.embed(texts).await?;
        total_processed += parsed.len();

        let mut scored: Vec<(ParsedUpload, f32)> = parsed
            .into_iter()
            .zip(vectors.iter())
            .map(|(upload, v)| {
                let score = cosine_similarity(&jd_embedding, v);
                (upload, score)
            })
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        for (upload, similarity) in scored {
            let match_score = format_score(similarity);
            if !passes_threshold(match_score, request.threshold) {
                debug!("{} below threshold ({match_score})", upload.filename);
                continue;
            }

            let mut warnings = Vec::new();
            if upload.text.trim().chars().count() < SHORT_TEXT_CHARS {
                warnings.push(SHORT_TEXT_WARNING.to_string());
            }

            uploaded_results.push(CandidateResult {
                rank: 0,
                candidate_name: pdf_candidate_name(&upload.filename),
                filename: upload.filename,
                source: ResultSource::Pdf,
                match_score: round_to(match_score, 1),
                skills: upload.skills,
                resume_text: upload.text,
                warnings: Some(warnings),
            });
        }
    }

    // 2. CSV corpus
    let mut database_results = Vec::new();
    if request.include_csv && state.corpus.is_ready() && state.corpus.len() > 0 {
        match state.corpus.search(&jd_embedding, state.config.csv_top_k) {
            Ok(hits) => {
                total_processed += hits.len();
                for hit in hits {
                    let match_score = format_score(hit.score);
                    if !passes_threshold(match_score, request.threshold) {
                        continue;
                    }

                    let clean = preprocess(&hit.record.full_text);
                    database_results.push(CandidateResult {
                        rank: 0,
                        candidate_name: csv_candidate_name(&hit.record.filename),
                        filename: hit.record.filename,
                        source: ResultSource::Csv,
                        match_score: round_to(match_score, 1),
                        skills: extract_skills(&clean),
                        resume_text: hit.record.full_text,
                        warnings: None,
                    });
                }
            }
            Err(e) => error!("Error searching CSV database: {e}"),
        }
    } else if request.include_csv {
        debug!("CSV database not ready; skipping corpus search");
    }

    // 3. Rank each source independently
    assign_ranks(&mut uploaded_results);
    assign_ranks(&mut database_results);

    Ok(ScreenResponse {
        total_processed,
        total_qualified: uploaded_results.len() + database_results.len(),
        processing_time_ms: 0.0,
        uploaded_results,
        database_results,
    })
}

/// Extracts, filters, stores and skill-tags each uploaded file.
/// Per-file problems are logged and the file is skipped.
async fn parse_uploads(
    state: &AppState,
    files: &[UploadedFile],
    saved: &mut Vec<PathBuf>,
) -> Vec<ParsedUpload> {
    let mut parsed = Vec::new();

    for file in files {
        let Some(filename) = sanitize_filename(&file.filename) else {
            debug!("Skipping upload without a filename");
            continue;
        };
        if file.content.is_empty() {
            debug!("Skipping empty upload {filename}");
            continue;
        }

        let content = file.content.clone();
        let name = filename.clone();
        let extracted =
            tokio::task::spawn_blocking(move || pdf::extract_text(&content, &name)).await;

        let text = match extracted {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                warn!("PDF Error: {e}");
                continue;
            }
            Err(e) => {
                warn!("PDF extraction task failed for {filename}: {e}");
                continue;
            }
        };

        if text.trim().chars().count() < MIN_TEXT_CHARS {
            warn!("Skipping {filename}: too little extractable text");
            continue;
        }

        match state.uploads.save(&filename, &file.content).await {
            Ok(path) => saved.push(path),
            Err(e) => {
                warn!("Failed to store upload {filename}: {e}");
                continue;
            }
        }

        let clean = preprocess(&text);
        debug!(
            "Extracted {} chars from {filename}, {} after cleanup",
            text.len(),
            clean.len()
        );
        let skills = extract_skills(&clean);

        parsed.push(ParsedUpload {
            filename,
            text,
            skills,
        });
    }

    parsed
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::embedding::testing::{
        ConstantEmbedder, FailAfterEmbedder, FailingEmbedder, HashingEmbedder,
    };
    use crate::embedding::Embedder;
    use crate::text::pdf::testing::single_page_pdf;

    const CSV: &str = "ID,Resume_str,Category\n\
        101,Senior Rust engineer building Kubernetes and Docker platforms,INFORMATION-TECHNOLOGY\n\
        202,Pastry chef baking croissants and cakes,CHEF\n";

    async fn state_with(
        dir: &tempfile::TempDir,
        csv: Option<&str>,
        embedder: Arc<dyn Embedder>,
        build: bool,
    ) -> AppState {
        let config = crate::config::Config::for_tests(dir.path());
        if let Some(contents) = csv {
            std::fs::write(&config.csv_path, contents).unwrap();
        }
        let state = AppState::new(config, embedder);
        if build {
            state
                .corpus
                .build_index(&HashingEmbedder::default())
                .await
                .unwrap();
        }
        state
    }

    fn pdf_upload(filename: &str, text: &str) -> UploadedFile {
        UploadedFile {
            filename: filename.to_string(),
            content: Bytes::from(single_page_pdf(text)),
        }
    }

    #[tokio::test]
    async fn test_empty_job_description_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with(&dir, None, Arc::new(HashingEmbedder::default()), false).await;

        let err = screen_resumes(&state, ScreenRequest::new("   \n"))
            .await
            .unwrap_err();
        match err {
            AppError::Validation(msg) => assert_eq!(msg, "Job description cannot be empty"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_csv_results_ranked_with_skills() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with(&dir, Some(CSV), Arc::new(HashingEmbedder::default()), true).await;

        let mut request = ScreenRequest::new("Rust engineer with Kubernetes and Docker");
        request.threshold = 0.0;
        let response = screen_resumes(&state, request).await.unwrap();

        assert!(response.uploaded_results.is_empty());
        assert_eq!(response.database_results.len(), 2);
        assert_eq!(response.total_processed, 2);
        assert_eq!(response.total_qualified, 2);

        let top = &response.database_results[0];
        assert_eq!(top.rank, 1);
        assert_eq!(top.source, ResultSource::Csv);
        assert_eq!(top.filename, "resume_101.csv");
        assert_eq!(top.candidate_name, "101");
        assert_eq!(top.skills, vec!["Docker", "Kubernetes", "Rust"]);
        assert!(top.warnings.is_none());
        assert_eq!(response.database_results[1].rank, 2);
        assert!(top.match_score >= response.database_results[1].match_score);
    }

    #[tokio::test]
    async fn test_threshold_filters_weak_matches() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with(&dir, Some(CSV), Arc::new(HashingEmbedder::default()), true).await;

        let mut request = ScreenRequest::new("Rust engineer with Kubernetes and Docker");
        request.threshold = 60.0;
        let response = screen_resumes(&state, request).await.unwrap();

        assert_eq!(response.database_results.len(), 1);
        assert_eq!(response.database_results[0].candidate_name, "101");
        assert_eq!(response.total_processed, 2);
        assert_eq!(response.total_qualified, 1);
    }

    #[tokio::test]
    async fn test_include_csv_false_skips_corpus() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with(&dir, Some(CSV), Arc::new(HashingEmbedder::default()), true).await;

        let mut request = ScreenRequest::new("Rust engineer");
        request.threshold = 0.0;
        request.include_csv = false;
        let response = screen_resumes(&state, request).await.unwrap();

        assert!(response.database_results.is_empty());
        assert_eq!(response.total_processed, 0);
    }

    #[tokio::test]
    async fn test_corpus_not_ready_returns_empty_lists() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with(&dir, Some(CSV), Arc::new(HashingEmbedder::default()), false).await;

        let mut request = ScreenRequest::new("Rust engineer");
        request.threshold = 0.0;
        let response = screen_resumes(&state, request).await.unwrap();
        assert!(response.database_results.is_empty());
        assert!(response.processing_time_ms >= 0.0);
    }

    #[tokio::test]
    async fn test_unreadable_uploads_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with(&dir, None, Arc::new(HashingEmbedder::default()), false).await;

        let mut request = ScreenRequest::new("Rust engineer");
        request.threshold = 0.0;
        request.files = vec![
            UploadedFile {
                filename: "broken.pdf".to_string(),
                content: Bytes::from_static(b"not really a pdf"),
            },
            UploadedFile {
                filename: "empty.pdf".to_string(),
                content: Bytes::new(),
            },
            UploadedFile {
                filename: String::new(),
                content: Bytes::from_static(b"%PDF"),
            },
        ];
        let response = screen_resumes(&state, request).await.unwrap();

        assert!(response.uploaded_results.is_empty());
        assert_eq!(response.total_processed, 0);
        assert!(!dir.path().join("uploads").join("broken.pdf").exists());
    }

    #[tokio::test]
    async fn test_embedding_failure_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with(&dir, None, Arc::new(FailingEmbedder), false).await;

        let err = screen_resumes(&state, ScreenRequest::new("Rust engineer"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Embedding(_)));
    }

    #[tokio::test]
    async fn test_pdf_uploads_are_scored_ranked_and_stored() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with(&dir, None, Arc::new(HashingEmbedder::default()), false).await;

        let mut request =
            ScreenRequest::new("Senior Rust engineer with Kubernetes and Docker experience");
        request.threshold = 0.0;
        request.include_csv = false;
        request.files = vec![
            pdf_upload("short.pdf", "Rust engineer Docker skills"),
            pdf_upload(
                "jane.pdf",
                "Senior Rust engineer with Kubernetes and Docker experience building platforms",
            ),
            pdf_upload("tiny.pdf", "Rust dev"),
        ];
        let response = screen_resumes(&state, request).await.unwrap();

        assert_eq!(response.total_processed, 2);
        assert_eq!(response.total_qualified, 2);
        assert!(response.database_results.is_empty());

        let results = &response.uploaded_results;
        assert_eq!(results.len(), 2);

        let jane = &results[0];
        assert_eq!(jane.rank, 1);
        assert_eq!(jane.filename, "jane.pdf");
        assert_eq!(jane.candidate_name, "jane");
        assert_eq!(jane.source, ResultSource::Pdf);
        assert_eq!(jane.skills, vec!["Docker", "Kubernetes", "Rust"]);
        assert_eq!(jane.warnings, Some(vec![]));
        assert!(jane.resume_text.contains("building platforms"));

        let short = &results[1];
        assert_eq!(short.rank, 2);
        assert_eq!(short.candidate_name, "short");
        assert_eq!(short.skills, vec!["Docker", "Rust"]);
        assert_eq!(
            short.warnings,
            Some(vec!["Scanned/Empty PDF detected".to_string()])
        );
        assert!(jane.match_score > short.match_score);

        let uploads = dir.path().join("uploads");
        assert!(uploads.join("jane.pdf").exists());
        assert!(uploads.join("short.pdf").exists());
        assert!(!uploads.join("tiny.pdf").exists());
    }

    #[tokio::test]
    async fn test_failure_after_saving_removes_uploads() {
        let dir = tempfile::tempdir().unwrap();
        // The job description embeds, the resume batch does not.
        let state = state_with(&dir, None, Arc::new(FailAfterEmbedder::new(1)), false).await;

        let mut request = ScreenRequest::new("Rust engineer with Kubernetes");
        request.files = vec![pdf_upload(
            "jane.pdf",
            "Senior Rust engineer with Kubernetes and Docker experience",
        )];
        let err = screen_resumes(&state, request).await.unwrap_err();

        assert!(matches!(err, AppError::Embedding(_)));
        assert!(!dir.path().join("uploads").join("jane.pdf").exists());
    }

    #[tokio::test]
    async fn test_failed_corpus_search_leaves_database_results_empty() {
        let dir = tempfile::tempdir().unwrap();
        // Corpus indexed with 64-dim vectors, requests embedded with 8-dim ones.
        let state = state_with(
            &dir,
            Some(CSV),
            Arc::new(ConstantEmbedder { dimension: 8 }),
            true,
        )
        .await;
        assert!(state.corpus.is_ready());

        let mut request = ScreenRequest::new("Rust engineer");
        request.threshold = 0.0;
        let response = screen_resumes(&state, request).await.unwrap();

        assert!(response.database_results.is_empty());
        assert_eq!(response.total_processed, 0);
        assert_eq!(response.total_qualified, 0);
    }
}
