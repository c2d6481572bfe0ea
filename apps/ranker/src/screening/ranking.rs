use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Where a ranked resume came from. Each source is ranked independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultSource {
    Pdf,
    Csv,
}

/// A single ranked resume as returned to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateResult {
    /// 1-based position within its source list; 0 until `assign_ranks` runs.
    pub rank: usize,
    pub filename: String,
    pub source: ResultSource,
    pub candidate_name: String,
    /// Percentage 0–100, one decimal.
    pub match_score: f64,
    pub skills: Vec<String>,
    pub resume_text: String,
    /// Upload diagnostics; absent for corpus results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Vec<String>>,
}

/// Sorts by descending `match_score` (stable for ties) and numbers from 1.
pub fn assign_ranks(results: &mut [CandidateResult]) {
    results.sort_by(|a, b| {
        b.match_score
            .partial_cmp(&a.match_score)
            .unwrap_or(Ordering::Equal)
    });
    for (i, result) in results.iter_mut().enumerate() {
        result.rank = i + 1;
    }
}

pub fn passes_threshold(match_score: f64, threshold: f64) -> bool {
    match_score >= threshold
}

/// `alice_smith.pdf` -> `alice_smith`
pub fn pdf_candidate_name(filename: &str) -> String {
    filename.replace(".pdf", "")
}

/// `resume_16852973.csv` -> `16852973`
pub fn csv_candidate_name(filename: &str) -> String {
    filename.replace(".csv", "").replace("resume_", "")
}
