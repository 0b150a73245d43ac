//! Request-scoped temporary files.
//!
//! A [`TempArtifact`] deletes its file exactly once: through
//! [`TempArtifact::discard`] on the normal path, or from `Drop` if the owner
//! unwinds or returns early. [`TempArtifact::into_path`] disarms the guard
//! and hands the file to the caller.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// A temporary file owned by one request.
#[derive(Debug)]
pub struct TempArtifact {
    path: Option<PathBuf>,
}

impl TempArtifact {
    /// Take ownership of an existing (or about to be written) path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Reserve a unique path `<dir>/<prefix>_<uuid>.<ext>`.
    ///
    /// Nothing is created on disk; the guard still removes the path if
    /// something writes it.
    pub fn reserve(dir: impl AsRef<Path>, prefix: &str, ext: &str) -> Self {
        Self::new(unique_path(dir, prefix, ext))
    }

    pub fn path(&self) -> &Path {
        self.path.as_deref().unwrap_or_else(|| Path::new(""))
    }

    /// Size of the file on disk, if it exists.
    pub async fn size(&self) -> Option<u64> {
        tokio::fs::metadata(self.path()).await.ok().map(|m| m.len())
    }

    /// Delete the file now.
    pub async fn discard(mut self) {
        if let Some(path) = self.path.take() {
            remove_quietly(&path).await;
        }
    }

    /// Keep the file and return its path. The caller now owns it.
    pub fn into_path(mut self) -> PathBuf {
        self.path.take().unwrap_or_default()
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            match std::fs::remove_file(&path) {
                Ok(()) => debug!(path = %path.display(), "Removed temp artifact on drop"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), "Failed to remove temp artifact: {}", e),
            }
        }
    }
}

/// `<dir>/<prefix>_<uuid>.<ext>`
pub fn unique_path(dir: impl AsRef<Path>, prefix: &str, ext: &str) -> PathBuf {
    dir.as_ref()
        .join(format!("{}_{}.{}", prefix, Uuid::new_v4(), ext))
}

/// Remove a file, ignoring "not found" and logging anything else.
pub async fn remove_quietly(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "Removed temp artifact"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), "Failed to remove temp artifact: {}", e),
    }
}

/// Discard every artifact in order.
pub async fn discard_all(artifacts: impl IntoIterator<Item = TempArtifact>) {
    for artifact in artifacts {
        artifact.discard().await;
    }
}
