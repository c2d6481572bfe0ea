use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::CorpusError;

/// Characters of resume text kept in the `text` preview.
const PREVIEW_CHARS: usize = 500;

/// Preferred text column first; HTML only when no plain-text column exists.
const TEXT_COLUMNS: &[&str] = &["Resume_str", "Resume_html"];

/// One resume from the CSV corpus, as stored alongside the vector index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeRecord {
    pub id: String,
    pub filename: String,
    pub category: String,
    /// Preview: the first 500 characters, with `...` appended when truncated.
    pub text: String,
    pub full_text: String,
}

impl ResumeRecord {
    pub fn new(id: String, category: String, full_text: String) -> Self {
        Self {
            filename: format!("resume_{id}.csv"),
            id,
            category,
            text: preview(&full_text),
            full_text,
        }
    }
}

fn preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Reads every usable resume from the CSV at `path`.
///
/// Returns an empty list (with a warning) when the file has no recognised
/// text column. Rows with blank text, or that fail to parse, are skipped.
pub fn load_records(path: &Path) -> Result<Vec<ResumeRecord>, CorpusError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)?;
    let headers = reader.headers()?.clone();

    let column = |name: &str| headers.iter().position(|h| h.trim() == name);
    let Some(text_col) = TEXT_COLUMNS.iter().find_map(|name| column(name)) else {
        warn!("No resume text column found in {}", path.display());
        return Ok(Vec::new());
    };
    let id_col = column("ID");
    let category_col = column("Category");

    let mut records = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!("Skipping unreadable CSV row {row}: {e}");
                continue;
            }
        };

        let text = record.get(text_col).unwrap_or("");
        if text.trim().is_empty() {
            continue;
        }

        let id = id_col
            .and_then(|c| record.get(c))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .unwrap_or_else(|| row.to_string());
        let category = category_col
            .and_then(|c| record.get(c))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("Unknown")
            .to_string();

        records.push(ResumeRecord::new(id, category, text.to_string()));
    }

    Ok(records)
}
