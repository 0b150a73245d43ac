//! Local directory object store used by the worker binary.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tracing::info;

use crate::collaborators::ObjectStore;
use crate::error::{PipelineError, PipelineResult};

/// Copies finished outputs into a directory, optionally reporting a public
/// URL built from a base prefix.
#[derive(Debug, Clone)]
pub struct LocalDirObjectStore {
    root: PathBuf,
    public_base_url: Option<String>,
}

impl LocalDirObjectStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: Option<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url,
        }
    }

    fn destination(&self, key: &str) -> PipelineResult<PathBuf> {
        let relative = Path::new(key);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if key.is_empty() || !safe {
            return Err(PipelineError::storage(format!("Invalid object key: {key}")));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStore for LocalDirObjectStore {
    async fn upload(&self, path: &Path, key: &str) -> PipelineResult<Option<String>> {
        let dest = self.destination(key)?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::copy(path, &dest)
            .await
            .map_err(|e| PipelineError::storage(format!("Failed to store {key}: {e}")))?;
        info!(key, dest = %dest.display(), "Stored output");

        Ok(self
            .public_base_url
            .as_ref()
            .map(|base| format!("{}/{}", base.trim_end_matches('/'), key)))
    }
}
