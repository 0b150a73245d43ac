//! Interfaces to the systems around the pipeline.
//!
//! The core only calls [`Downloader`] and [`TemplateStore`]. Storage and
//! usage metering are driven by whoever embeds the core, with the facts the
//! core hands back.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use overlay_models::{StyleTemplate, UsageFacts};

use crate::error::PipelineResult;

/// A source file fetched into the work directory.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadedFile {
    pub path: PathBuf,
    pub content_type: Option<String>,
    pub size: u64,
}

/// Fetches a remote asset to a local file.
///
/// On failure nothing may be left on disk.
#[async_trait]
pub trait Downloader: Send + Sync {
    async fn fetch(&self, url: &str) -> PipelineResult<DownloadedFile>;
}

/// Looks up named style templates.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    async fn resolve(&self, name: &str) -> Option<StyleTemplate>;

    /// Names of every known template.
    async fn names(&self) -> Vec<String>;
}

/// Durable storage for finished outputs.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `path` under `key`, returning a public URL when one exists.
    async fn upload(&self, path: &Path, key: &str) -> PipelineResult<Option<String>>;
}

/// Persists usage facts.
#[async_trait]
pub trait UsageRecorder: Send + Sync {
    async fn record(&self, facts: &UsageFacts) -> PipelineResult<()>;
}
