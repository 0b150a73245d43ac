//! Background removal gate.
//!
//! The matting model is an external collaborator behind [`MattingBackend`].
//! This module bounds how many removals run at once, keeps one session per
//! model for the lifetime of the remover, and runs the CPU-bound matting on
//! the blocking pool so async tasks keep making progress.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, info, warn};

use overlay_media::TempArtifact;
use overlay_models::{MediaKind, UsageFacts};

use crate::collaborators::Downloader;
use crate::error::{PipelineError, PipelineResult};
use crate::metrics;

/// Model used when none is configured.
pub const DEFAULT_MATTING_MODEL: &str = "u2net";

/// Concurrent removals allowed by default.
pub const DEFAULT_MAX_PARALLEL: usize = 3;

/// Endpoint name reported in usage facts.
pub const BACKGROUND_ENDPOINT: &str = "/rembg";

/// A loaded matting model.
pub trait MattingSession: Send + Sync {
    /// Encoded image in, PNG with alpha out.
    fn remove_background(&self, image: &[u8]) -> Result<Vec<u8>, String>;
}

/// Creates matting sessions. Creation may be slow (model load).
pub trait MattingBackend: Send + Sync {
    fn new_session(&self, model: &str) -> Result<Arc<dyn MattingSession>, String>;
}

/// Sessions keyed by model id, created on first use.
#[derive(Default)]
pub struct SessionCache {
    sessions: Mutex<HashMap<String, Arc<dyn MattingSession>>>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached session for `model`, creating it if needed.
    pub async fn get_or_create(
        &self,
        backend: &Arc<dyn MattingBackend>,
        model: &str,
    ) -> PipelineResult<Arc<dyn MattingSession>> {
        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.get(model) {
            return Ok(Arc::clone(session));
        }

        info!(model, "Creating matting session");
        let backend = Arc::clone(backend);
        let model_id = model.to_string();
        let session = tokio::task::spawn_blocking(move || backend.new_session(&model_id))
            .await
            .map_err(|e| PipelineError::background_removal(format!("Session task failed: {e}")))?
            .map_err(PipelineError::background_removal)?;

        sessions.insert(model.to_string(), Arc::clone(&session));
        Ok(session)
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}

/// A finished removal. The caller owns `output`.
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundOutcome {
    pub output: PathBuf,
    pub size: u64,
    pub usage: UsageFacts,
}

/// Bounded, session-caching background remover.
pub struct BackgroundRemover {
    backend: Arc<dyn MattingBackend>,
    sessions: SessionCache,
    permits: Arc<Semaphore>,
    downloader: Arc<dyn Downloader>,
    work_dir: PathBuf,
    model: String,
}

impl BackgroundRemover {
    pub fn new(
        backend: Arc<dyn MattingBackend>,
        downloader: Arc<dyn Downloader>,
        work_dir: impl Into<PathBuf>,
        max_parallel: usize,
    ) -> Self {
        Self {
            backend,
            sessions: SessionCache::new(),
            permits: Arc::new(Semaphore::new(max_parallel.max(1))),
            downloader,
            work_dir: work_dir.into(),
            model: DEFAULT_MATTING_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn sessions(&self) -> &SessionCache {
        &self.sessions
    }

    /// Download the image at `url` and write a transparent-background PNG.
    pub async fn remove(&self, url: &str) -> PipelineResult<BackgroundOutcome> {
        if url.trim().is_empty() {
            return Err(PipelineError::validation("url is required"));
        }

        let started = Instant::now();
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| PipelineError::background_removal(e.to_string()))?;
        debug!(
            available = self.permits.available_permits(),
            "Acquired background removal permit"
        );

        let result = self.run(url, started).await;
        match &result {
            Ok(outcome) => {
                metrics::record_background_removal("success");
                info!(output = %outcome.output.display(), size = outcome.size, "Background removed");
            }
            Err(e) => {
                metrics::record_background_removal("failure");
                warn!("Background removal failed: {}", e);
            }
        }
        result
    }

    async fn run(&self, url: &str, started: Instant) -> PipelineResult<BackgroundOutcome> {
        let downloaded = self.downloader.fetch(url).await?;
        let input_bytes = downloaded.size;
        let source = TempArtifact::new(downloaded.path);

        if !MediaKind::from_path(source.path()).is_image() {
            let message = format!("not an image: {}", source.path().display());
            source.discard().await;
            return Err(PipelineError::unsupported_media(None, message));
        }

        let output = TempArtifact::reserve(&self.work_dir, "rembg", "png");
        match self.matte(&source, &output).await {
            Ok(size) => {
                source.discard().await;
                Ok(BackgroundOutcome {
                    output: output.into_path(),
                    size,
                    usage: UsageFacts {
                        endpoint: BACKGROUND_ENDPOINT.to_string(),
                        input_bytes,
                        output_bytes: size,
                        processing_time_ms: started.elapsed().as_millis() as u64,
                        template_used: "none".to_string(),
                        has_custom_overrides: false,
                    },
                })
            }
            Err(e) => {
                source.discard().await;
                output.discard().await;
                Err(e)
            }
        }
    }

    async fn matte(&self, source: &TempArtifact, output: &TempArtifact) -> PipelineResult<u64> {
        let session = self
            .sessions
            .get_or_create(&self.backend, &self.model)
            .await?;
        let image = tokio::fs::read(source.path()).await?;

        let png = tokio::task::spawn_blocking(move || session.remove_background(&image))
            .await
            .map_err(|e| PipelineError::background_removal(format!("Matting task failed: {e}")))?
            .map_err(PipelineError::background_removal)?;

        if png.is_empty() {
            return Err(PipelineError::background_removal("Matting produced no output"));
        }

        tokio::fs::write(output.path(), &png).await?;
        Ok(png.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::DownloadedFile;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingSession {
        active: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
        fail: bool,
    }

    impl MattingSession for CountingSession {
        fn remove_background(&self, image: &[u8]) -> Result<Vec<u8>, String> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(50));
            self.active.fetch_sub(1, Ordering::SeqCst);
            if self.fail {
                return Err("model exploded".to_string());
            }
            let mut out = b"PNG".to_vec();
            out.extend_from_slice(image);
            Ok(out)
        }
    }

    struct FakeBackend {
        created: AtomicUsize,
        active: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
        fail: bool,
    }

    impl FakeBackend {
        fn new(fail: bool) -> Self {
            Self {
                created: AtomicUsize::new(0),
                active: Arc::new(AtomicUsize::new(0)),
                peak: Arc::new(AtomicUsize::new(0)),
                fail,
            }
        }
    }

    impl MattingBackend for FakeBackend {
        fn new_session(&self, _model: &str) -> Result<Arc<dyn MattingSession>, String> {
            self.created.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(CountingSession {
                active: Arc::clone(&self.active),
                peak: Arc::clone(&self.peak),
                fail: self.fail,
            }))
        }
    }

    /// Writes a small file named after the URL's last segment.
    struct LocalDownloader {
        dir: PathBuf,
    }

    #[async_trait]
    impl Downloader for LocalDownloader {
        async fn fetch(&self, url: &str) -> PipelineResult<DownloadedFile> {
            let name = url.rsplit('/').next().unwrap_or("file.bin");
            let path = self.dir.join(format!("{}_{}", uuid::Uuid::new_v4(), name));
            tokio::fs::write(&path, b"image").await?;
            Ok(DownloadedFile {
                path,
                content_type: None,
                size: 5,
            })
        }
    }

    fn remover(backend: Arc<FakeBackend>, dir: &std::path::Path) -> BackgroundRemover {
        BackgroundRemover::new(
            backend,
            Arc::new(LocalDownloader {
                dir: dir.to_path_buf(),
            }),
            dir,
            DEFAULT_MAX_PARALLEL,
        )
    }

    fn files_in(dir: &std::path::Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_is_bounded_and_session_reused() {
        let dir = tempfile::TempDir::new().unwrap();
        let backend = Arc::new(FakeBackend::new(false));
        let remover = Arc::new(remover(Arc::clone(&backend), dir.path()));

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let remover = Arc::clone(&remover);
                tokio::spawn(async move { remover.remove(&format!("https://x/{i}.png")).await })
            })
            .collect();

        let mut outputs = Vec::new();
        for task in tasks {
            outputs.push(task.await.unwrap().unwrap());
        }

        assert!(backend.peak.load(Ordering::SeqCst) <= DEFAULT_MAX_PARALLEL);
        assert_eq!(backend.created.load(Ordering::SeqCst), 1);
        assert_eq!(remover.sessions().len().await, 1);

        // Only the PNG outputs remain
        assert_eq!(files_in(dir.path()), 8);
        for outcome in &outputs {
            assert_eq!(outcome.size, 8);
            assert_eq!(outcome.output.extension().unwrap(), "png");
        }
    }

    #[tokio::test]
    async fn test_failure_removes_everything() {
        let dir = tempfile::TempDir::new().unwrap();
        let remover = remover(Arc::new(FakeBackend::new(true)), dir.path());

        let err = remover.remove("https://x/photo.jpg").await.unwrap_err();
        assert!(matches!(err, PipelineError::BackgroundRemoval(_)));
        assert_eq!(files_in(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_rejects_non_images() {
        let dir = tempfile::TempDir::new().unwrap();
        let remover = remover(Arc::new(FakeBackend::new(false)), dir.path());

        let err = remover.remove("https://x/clip.mp4").await.unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedMedia { .. }));
        assert_eq!(files_in(dir.path()), 0);
        assert!(remover.sessions().is_empty().await);
    }
}
