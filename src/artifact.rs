//! Downloadable artifacts (generated audio and infographics).

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("could not write artifact {path}: {source}")]
    WriteFailed {
        path: String,
        source: std::io::Error,
    },
}

/// Derives a filesystem-safe artifact name from a note title: every
/// non-alphanumeric character becomes `_` and the result is lowercased.
pub fn suggested_filename(title: &str, suffix: &str) -> String {
    let sanitized: String = title
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();

    format!("{sanitized}_{suffix}")
}

/// Writes an artifact into the artifacts directory, creating it if needed.
pub async fn save(dir: &str, filename: &str, bytes: &[u8]) -> Result<PathBuf, ArtifactError> {
    let dir = Path::new(dir);

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| ArtifactError::WriteFailed {
            path: dir.display().to_string(),
            source,
        })?;

    let path = dir.join(filename);

    tokio::fs::write(&path, bytes)
        .await
        .map_err(|source| ArtifactError::WriteFailed {
            path: path.display().to_string(),
            source,
        })?;

    Ok(path)
}
