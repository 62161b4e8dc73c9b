use std::{io, path::Path};

use tokio::fs;

/// Returns `true` when something exists at `path`.
///
/// Errors while probing count as "missing".
pub async fn exists(path: &Path) -> bool {
    fs::try_exists(path).await.unwrap_or(false)
}

/// Creates `dir` and every missing parent.
pub async fn ensure_dir(dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir).await
}

/// Removes the regular file at `path`, logging instead of failing.
///
/// Returns `true` when a file was removed.
pub async fn remove_file_best_effort(path: &Path) -> bool {
    match fs::metadata(path).await {
        Ok(metadata) if metadata.is_file() => match fs::remove_file(path).await {
            Ok(()) => {
                tracing::info!(path = %path.display(), "removed stored file");
                true
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "failed to remove stored file");
                false
            }
        },
        Ok(_) => {
            tracing::debug!(path = %path.display(), "not a regular file, nothing removed");
            false
        }
        Err(_) => false,
    }
}
