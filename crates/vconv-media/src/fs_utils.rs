//! Filesystem helpers for task directories.

use std::path::Path;
use tokio::fs;

use crate::error::{MediaError, MediaResult};

/// Create `dir` and its parents. An existing directory is fine.
pub async fn ensure_dir(dir: impl AsRef<Path>) -> MediaResult<()> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)
        .await
        .map_err(|source| MediaError::OutputDir {
            path: dir.to_path_buf(),
            source,
        })
}

/// Delete the merged intermediate once it has been packaged.
pub async fn remove_intermediate(path: impl AsRef<Path>) -> MediaResult<()> {
    let path = path.as_ref();
    fs::remove_file(path).await.map_err(|source| MediaError::Cleanup {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!("Removed intermediate file {}", path.display());
    Ok(())
}
