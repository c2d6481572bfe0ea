// Flat inner-product vector index.
// Brute-force exact search over a dense row-major matrix, persisted with bincode.

mod flat;

pub use flat::{FlatIndex, IndexError};

use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

/// Writes `value` to `path` via a temp file in the same directory, so readers
/// never observe a partially written file.
pub fn write_bincode<T: Serialize>(value: &T, path: &Path) -> Result<(), IndexError> {
    let bytes =
        bincode::serialize(value).map_err(|e| IndexError::Serialization(e.to_string()))?;

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    std::io::Write::write_all(&mut tmp, &bytes)?;
    tmp.persist(path).map_err(|e| IndexError::Io(e.error))?;
    Ok(())
}

pub fn read_bincode<T: DeserializeOwned>(path: &Path) -> Result<T, IndexError> {
    let bytes = std::fs::read(path)?;
    bincode::deserialize(&bytes).map_err(|e| IndexError::Serialization(e.to_string()))
}
