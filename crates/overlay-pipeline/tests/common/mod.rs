//! Shared fakes for pipeline integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use overlay_media::filters::ConcatFilter;
use overlay_media::render::verify_output;
use overlay_media::{
    MediaEngine, MediaError, MediaResult, OverlayTarget, RenderResult, TrimWindow,
};
use overlay_models::{FontCatalog, MediaMetadata};
use overlay_pipeline::{
    ClipPipelineOrchestrator, DownloadedFile, Downloader, InMemoryTemplateStore, PipelineConfig,
    PipelineError, PipelineResult, StyleResolver,
};

/// Downloader that writes small files into the work directory.
///
/// URLs containing `fail` return an error; `slow` URLs finish last so
/// completion order differs from submission order.
pub struct FakeDownloader {
    pub dir: PathBuf,
    pub calls: AtomicUsize,
}

impl FakeDownloader {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Downloader for FakeDownloader {
    async fn fetch(&self, url: &str) -> PipelineResult<DownloadedFile> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if url.contains("slow") {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        if url.contains("fail") {
            return Err(PipelineError::download(None, "HTTP 404 Not Found"));
        }

        let ext = url.rsplit('.').next().unwrap_or("mp4");
        let path = self
            .dir
            .join(format!("source_{}.{}", uuid::Uuid::new_v4(), ext));
        tokio::fs::write(&path, url.as_bytes()).await?;

        Ok(DownloadedFile {
            size: url.len() as u64,
            path,
            content_type: None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Overlay {
        input: PathBuf,
        filter: String,
        target: OverlayTarget,
    },
    Trim(TrimWindow),
    Concat {
        inputs: usize,
        filter_complex: String,
    },
}

/// Media engine that writes placeholder outputs and records every call.
#[derive(Default)]
pub struct FakeEngine {
    /// Metadata returned by default for every probe
    pub metadata: MediaMetadata,
    /// Metadata for probes of files whose name or contents contain the key.
    /// Rendered outputs carry their input's contents, so a source URL
    /// fragment keeps matching after overlay.
    pub metadata_by_name: HashMap<String, MediaMetadata>,
    /// 1-based overlay call that fails
    pub fail_overlay_on: Option<usize>,
    pub fail_concat: bool,
    pub calls: Mutex<Vec<EngineCall>>,
    pub overlay_count: AtomicUsize,
}

impl FakeEngine {
    pub fn with_metadata(metadata: MediaMetadata) -> Self {
        Self {
            metadata,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn overlay_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, EngineCall::Overlay { .. }))
            .count()
    }
}

#[async_trait]
impl MediaEngine for FakeEngine {
    async fn probe(&self, path: &Path) -> MediaMetadata {
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        let body = std::fs::read_to_string(path).unwrap_or_default();
        self.metadata_by_name
            .iter()
            .find(|(key, _)| name.contains(key.as_str()) || body.contains(key.as_str()))
            .map(|(_, meta)| meta.clone())
            .unwrap_or_else(|| self.metadata.clone())
    }

    async fn render_overlay(
        &self,
        input: &Path,
        output: &Path,
        filter: &str,
        target: OverlayTarget,
    ) -> MediaResult<RenderResult> {
        let n = self.overlay_count.fetch_add(1, Ordering::SeqCst) + 1;
        self.calls.lock().unwrap().push(EngineCall::Overlay {
            input: input.to_path_buf(),
            filter: filter.to_string(),
            target,
        });

        if self.fail_overlay_on == Some(n) {
            // Leave a partial file behind like a crashed encoder would
            std::fs::write(output, b"partial")?;
            return Err(MediaError::render_failed(
                "FFmpeg exited with non-zero status",
                Some("Invalid data found when processing input".to_string()),
                Some(1),
            ));
        }

        std::fs::copy(input, output)?;
        verify_output(output).await
    }

    async fn render_trim(
        &self,
        input: &Path,
        output: &Path,
        window: TrimWindow,
    ) -> MediaResult<RenderResult> {
        self.calls.lock().unwrap().push(EngineCall::Trim(window));
        std::fs::copy(input, output)?;
        verify_output(output).await
    }

    async fn render_concat(
        &self,
        inputs: &[PathBuf],
        output: &Path,
        filter: &ConcatFilter,
    ) -> MediaResult<RenderResult> {
        self.calls.lock().unwrap().push(EngineCall::Concat {
            inputs: inputs.len(),
            filter_complex: filter.filter_complex.clone(),
        });
        for input in inputs {
            assert!(input.exists(), "concat input missing: {}", input.display());
        }

        if self.fail_concat {
            std::fs::write(output, b"half a movie")?;
            return Err(MediaError::RenderTimeout(600));
        }

        std::fs::write(output, b"merged video")?;
        let mut result = verify_output(output).await?;
        result.duration = Some(18.0);
        Ok(result)
    }
}

pub fn config(work_dir: &Path) -> PipelineConfig {
    PipelineConfig {
        work_dir: work_dir.to_path_buf(),
        font_dir: PathBuf::from("/fonts"),
        ..Default::default()
    }
}

pub fn orchestrator(
    work_dir: &Path,
    downloader: Arc<FakeDownloader>,
    engine: Arc<FakeEngine>,
) -> ClipPipelineOrchestrator {
    let fonts = FontCatalog::from_dir("/fonts");
    let styles = StyleResolver::new(Arc::new(InMemoryTemplateStore::new(&fonts)), fonts);
    ClipPipelineOrchestrator::new(downloader, engine, styles, config(work_dir))
}

/// Names of every file currently in `dir`.
pub fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

pub fn video(duration: f64, has_audio: bool) -> MediaMetadata {
    MediaMetadata {
        width: Some(1080),
        height: Some(1920),
        duration: Some(duration),
        has_audio,
    }
}
