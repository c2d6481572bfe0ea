use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

pub const DEFAULT_MODEL_ID: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Application configuration loaded from environment variables.
/// Every setting has a default; only malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub csv_path: PathBuf,
    pub index_path: PathBuf,
    pub metadata_path: PathBuf,
    pub uploads_dir: PathBuf,
    pub static_dir: PathBuf,
    pub templates_dir: PathBuf,
    pub model_id: String,
    pub embedding_batch_size: usize,
    pub csv_top_k: usize,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let max_upload_mb: usize = parse_env("MAX_UPLOAD_MB", 50)?;

        Ok(Config {
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            csv_path: path_env("RESUME_CSV_PATH", "Resume.csv"),
            index_path: path_env("INDEX_PATH", "resume_index.bin"),
            metadata_path: path_env("METADATA_PATH", "resume_metadata.bin"),
            uploads_dir: path_env("UPLOADS_DIR", "uploads"),
            static_dir: path_env("STATIC_DIR", "static"),
            templates_dir: path_env("TEMPLATES_DIR", "templates"),
            model_id: std::env::var("EMBEDDING_MODEL_ID")
                .unwrap_or_else(|_| DEFAULT_MODEL_ID.to_string()),
            embedding_batch_size: parse_env::<usize>("EMBEDDING_BATCH_SIZE", 32)?.max(1),
            csv_top_k: parse_env("CSV_TOP_K", 10)?,
            max_upload_bytes: max_upload_mb * 1024 * 1024,
        })
    }
}

fn path_env(key: &str, default: &str) -> PathBuf {
    std::env::var(key)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    /// Configuration rooted in a scratch directory, for tests.
    pub fn for_tests(root: &std::path::Path) -> Self {
        Config {
            port: 0,
            rust_log: "debug".to_string(),
            csv_path: root.join("Resume.csv"),
            index_path: root.join("resume_index.bin"),
            metadata_path: root.join("resume_metadata.bin"),
            uploads_dir: root.join("uploads"),
            static_dir: root.join("static"),
            templates_dir: root.join("templates"),
            model_id: "test-embedder".to_string(),
            embedding_batch_size: 2,
            csv_top_k: 10,
            max_upload_bytes: 1024 * 1024,
        }
    }
}
