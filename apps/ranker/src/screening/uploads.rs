use std::path::{Path, PathBuf};

use tracing::warn;

use crate::errors::AppError;

/// Reduces a client-supplied filename to a safe basename.
///
/// Directory components (either separator) are dropped, quotes and control
/// characters removed. Returns `None` when nothing usable is left.
pub fn sanitize_filename(raw: &str) -> Option<String> {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or("");
    let cleaned: String = base
        .chars()
        .filter(|c| !c.is_control() && *c != '"')
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        return None;
    }
    Some(cleaned.to_string())
}

/// Directory holding uploaded resumes for later download.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub async fn ensure_dir(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }

    /// Writes `content` under `filename` (already sanitized), replacing any previous file.
    pub async fn save(&self, filename: &str, content: &[u8]) -> std::io::Result<PathBuf> {
        self.ensure_dir().await?;
        let path = self.dir.join(filename);
        tokio::fs::write(&path, content).await?;
        Ok(path)
    }

    /// Best-effort removal; failures are logged.
    pub async fn remove_all(&self, paths: &[PathBuf]) {
        for path in paths {
            if let Err(e) = tokio::fs::remove_file(path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to remove {}: {e}", path.display());
                }
            }
        }
    }

    /// Maps a download request onto a path inside the store.
    /// Anything that is not already a plain basename is rejected.
    pub fn resolve(&self, requested: &str) -> Result<PathBuf, AppError> {
        match sanitize_filename(requested) {
            Some(name) if name == requested => Ok(self.dir.join(name)),
            _ => Err(AppError::Validation(format!(
                "Invalid filename: {requested}"
            ))),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
