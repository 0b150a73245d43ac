//! Multi-clip merge orchestration.
//!
//! A merge moves through `Validating -> Downloading -> Overlaying ->
//! Trimming (optional) -> Concatenating -> Done`, or to `Failed` from any
//! of them. Every temporary file is held by a [`TempArtifact`] and removed
//! exactly once whichever way the request ends. Only the final output
//! survives success, and ownership of it passes to the caller.

use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

use overlay_media::artifact::discard_all;
use overlay_media::{
    apply_text_overlay, merge_clips, trim_clip, MediaEngine, MediaError, OverlayTarget,
    TempArtifact, TrimOutcome, STILL_CLIP_SECONDS,
};
use overlay_models::media::is_supported_extension;
use overlay_models::{ClipJob, MediaKind, MergeRequest, StyleDescriptor, UsageFacts};

use crate::collaborators::Downloader;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult, Stage};
use crate::metrics;
use crate::style::StyleResolver;

/// Endpoint name reported in merge usage facts.
pub const MERGE_ENDPOINT: &str = "/merge";

/// Template name reported for merges, which may mix templates.
pub const MULTIPLE_TEMPLATES: &str = "multiple";

/// A finished merge. The caller owns `output`.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub output: PathBuf,
    pub size: u64,
    pub duration: Option<f64>,
    pub clips_processed: usize,
    pub usage: UsageFacts,
}

/// Runs merge and single-overlay requests against the media engine.
#[derive(Clone)]
pub struct ClipPipelineOrchestrator {
    pub(crate) downloader: Arc<dyn Downloader>,
    pub(crate) engine: Arc<dyn MediaEngine>,
    pub(crate) styles: StyleResolver,
    pub(crate) config: PipelineConfig,
}

/// Per-request progress tracker that logs every state change.
struct MergeRun {
    id: Uuid,
    stage: Stage,
}

impl MergeRun {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            stage: Stage::Validating,
        }
    }

    fn enter(&mut self, stage: Stage) {
        info!(merge_id = %self.id, from = %self.stage, to = %stage, "Merge stage transition");
        self.stage = stage;
    }
}

impl ClipPipelineOrchestrator {
    pub fn new(
        downloader: Arc<dyn Downloader>,
        engine: Arc<dyn MediaEngine>,
        styles: StyleResolver,
        config: PipelineConfig,
    ) -> Self {
        Self {
            downloader,
            engine,
            styles,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn work_dir(&self) -> &Path {
        &self.config.work_dir
    }

    /// Download, overlay, optionally trim, and concatenate the clips of
    /// `request` into one file.
    pub async fn merge(&self, request: &MergeRequest) -> PipelineResult<MergeOutcome> {
        let started = Instant::now();
        let mut run = MergeRun::new();
        info!(merge_id = %run.id, clips = request.clips.len(), "Merge request received");

        let result = self.run_merge(&mut run, request, started).await;
        let elapsed = started.elapsed().as_secs_f64();

        match &result {
            Ok(outcome) => {
                run.enter(Stage::Done);
                metrics::record_merge("success", Stage::Done.as_str(), elapsed);
                metrics::record_clips_processed(outcome.clips_processed);
                info!(
                    merge_id = %run.id,
                    output = %outcome.output.display(),
                    size = outcome.size,
                    duration = ?outcome.duration,
                    elapsed_secs = elapsed,
                    "Merge complete"
                );
            }
            Err(e) => {
                let failed_in = run.stage;
                run.enter(Stage::Failed);
                metrics::record_merge("failure", failed_in.as_str(), elapsed);
                error!(
                    merge_id = %run.id,
                    stage = %failed_in,
                    clip = ?e.clip(),
                    "Merge failed: {}", e
                );
            }
        }

        result
    }

    async fn run_merge(
        &self,
        run: &mut MergeRun,
        request: &MergeRequest,
        started: Instant,
    ) -> PipelineResult<MergeOutcome> {
        self.validate(request)?;
        let styles = self.resolve_styles(&request.clips).await?;

        run.enter(Stage::Downloading);
        let (sources, input_bytes) = self.download_all(&request.clips).await?;

        run.enter(Stage::Overlaying);
        let mut overlays = self.overlay_all(run, &request.clips, &styles, sources).await?;

        if let Some(target) = request.first_clip_duration {
            run.enter(Stage::Trimming);
            if let Err(e) = self.trim_first(&mut overlays, target, request).await {
                discard_all(overlays).await;
                return Err(e);
            }
        }

        run.enter(Stage::Concatenating);
        let output = TempArtifact::reserve(
            &self.config.work_dir,
            "merged",
            request.output_format.extension(),
        );
        let inputs: Vec<PathBuf> = overlays.iter().map(|a| a.path().to_path_buf()).collect();
        let merged = merge_clips(self.engine.as_ref(), &inputs, output.path()).await;
        discard_all(overlays).await;

        let rendered = match merged {
            Ok(rendered) => rendered,
            Err(e) => {
                output.discard().await;
                return Err(match e {
                    MediaError::DurationUnavailable { index } => {
                        PipelineError::DurationUnavailable { clip: index }
                    }
                    other => PipelineError::render(Stage::Concatenating, None, other),
                });
            }
        };

        let usage = UsageFacts {
            endpoint: MERGE_ENDPOINT.to_string(),
            input_bytes,
            output_bytes: rendered.size,
            processing_time_ms: started.elapsed().as_millis() as u64,
            template_used: MULTIPLE_TEMPLATES.to_string(),
            has_custom_overrides: request.has_overrides(),
        };

        Ok(MergeOutcome {
            output: output.into_path(),
            size: rendered.size,
            duration: rendered.duration,
            clips_processed: request.clips.len(),
            usage,
        })
    }

    /// Check limits and per-clip fields. Allocates nothing.
    pub fn validate(&self, request: &MergeRequest) -> PipelineResult<()> {
        let count = request.clips.len();
        if count < 2 {
            return Err(PipelineError::validation(format!(
                "At least 2 clips are required, got {count}"
            )));
        }
        if count > self.config.max_merge_clips {
            return Err(PipelineError::validation(format!(
                "Maximum {} clips allowed per merge request, got {count}",
                self.config.max_merge_clips
            )));
        }

        for (idx, clip) in request.clips.iter().enumerate() {
            self.validate_clip(clip)
                .map_err(|msg| PipelineError::validation(format!("Clip {}: {msg}", idx + 1)))?;
        }

        if let Some(duration) = request.first_clip_duration {
            if !(duration.is_finite() && duration > 0.0) {
                return Err(PipelineError::validation(format!(
                    "first_clip_duration must be positive, got {duration}"
                )));
            }
        }

        Ok(())
    }

    pub(crate) fn validate_text(&self, url: &str, text: &str) -> Result<(), String> {
        if url.trim().is_empty() {
            return Err("url is required".to_string());
        }
        if text.trim().is_empty() {
            return Err("text is required".to_string());
        }
        let len = text.chars().count();
        if len > self.config.max_text_length {
            return Err(format!(
                "text is {len} characters, maximum is {}",
                self.config.max_text_length
            ));
        }
        Ok(())
    }

    fn validate_clip(&self, clip: &ClipJob) -> Result<(), String> {
        self.validate_text(&clip.url, &clip.text)?;
        if let Some(overrides) = &clip.overrides {
            overrides.validate()?;
        }
        Ok(())
    }

    async fn resolve_styles(&self, clips: &[ClipJob]) -> PipelineResult<Vec<StyleDescriptor>> {
        let mut styles = Vec::with_capacity(clips.len());
        for clip in clips {
            styles.push(
                self.styles
                    .resolve(&clip.template, clip.overrides.as_ref())
                    .await?,
            );
        }
        Ok(styles)
    }

    /// Fetch every clip concurrently. On any failure every successful
    /// download is removed and the first failing clip is reported.
    async fn download_all(&self, clips: &[ClipJob]) -> PipelineResult<(Vec<TempArtifact>, u64)> {
        let results = join_all(clips.iter().map(|clip| self.downloader.fetch(&clip.url))).await;

        let mut sources = Vec::with_capacity(clips.len());
        let mut total_bytes = 0u64;
        let mut first_error = None;

        for (idx, result) in results.into_iter().enumerate() {
            match result {
                Ok(file) => {
                    total_bytes += file.size;
                    let artifact = TempArtifact::new(file.path);
                    if first_error.is_none() && !is_supported_extension(artifact.path()) {
                        first_error = Some(PipelineError::unsupported_media(
                            Some(idx + 1),
                            format!("unsupported file type: {}", artifact.path().display()),
                        ));
                    }
                    sources.push(artifact);
                }
                Err(e) => {
                    warn!(clip = idx + 1, "Clip download failed: {}", e);
                    if first_error.is_none() {
                        first_error = Some(e.for_clip(idx + 1));
                    }
                }
            }
        }

        if let Some(e) = first_error {
            discard_all(sources).await;
            return Err(e);
        }

        Ok((sources, total_bytes))
    }

    /// Overlay clips one at a time in submission order. Each source is
    /// removed as soon as its overlay exists.
    async fn overlay_all(
        &self,
        run: &MergeRun,
        clips: &[ClipJob],
        styles: &[StyleDescriptor],
        sources: Vec<TempArtifact>,
    ) -> PipelineResult<Vec<TempArtifact>> {
        let total = sources.len();
        let mut overlays: Vec<TempArtifact> = Vec::with_capacity(total);
        let mut pending = sources.into_iter().enumerate();

        while let Some((idx, source)) = pending.next() {
            info!(merge_id = %run.id, clip = idx + 1, total, "Applying overlay");

            let result = self.overlay_clip(&source, &clips[idx].text, &styles[idx]).await;
            source.discard().await;

            match result {
                Ok(output) => overlays.push(output),
                Err(e) => {
                    discard_all(pending.map(|(_, s)| s)).await;
                    discard_all(overlays).await;
                    return Err(PipelineError::render(Stage::Overlaying, Some(idx + 1), e));
                }
            }
        }

        Ok(overlays)
    }

    async fn overlay_clip(
        &self,
        source: &TempArtifact,
        text: &str,
        style: &StyleDescriptor,
    ) -> Result<TempArtifact, MediaError> {
        let output = TempArtifact::reserve(&self.config.work_dir, "overlayed", "mp4");
        let target = if MediaKind::from_path(source.path()).is_image() {
            OverlayTarget::StillAsVideo {
                seconds: STILL_CLIP_SECONDS,
            }
        } else {
            OverlayTarget::Video
        };

        match apply_text_overlay(
            self.engine.as_ref(),
            source.path(),
            output.path(),
            text,
            style,
            target,
        )
        .await
        {
            Ok(_) => Ok(output),
            Err(e) => {
                output.discard().await;
                Err(e)
            }
        }
    }

    /// Replace the first overlay with a trimmed copy when it is longer than
    /// `target`. Leaves `overlays` intact for the caller to clean on error.
    async fn trim_first(
        &self,
        overlays: &mut [TempArtifact],
        target: f64,
        request: &MergeRequest,
    ) -> PipelineResult<()> {
        let Some(first) = overlays.first_mut() else {
            return Ok(());
        };

        let trimmed = TempArtifact::reserve(&self.config.work_dir, "trimmed", "mp4");
        let outcome = trim_clip(
            self.engine.as_ref(),
            first.path(),
            trimmed.path(),
            target,
            request.first_clip_trim_mode,
        )
        .await;

        match outcome {
            Ok(TrimOutcome::Trimmed(_)) => {
                let untrimmed = std::mem::replace(first, trimmed);
                untrimmed.discard().await;
                Ok(())
            }
            Ok(TrimOutcome::Unchanged { duration }) => {
                info!(
                    duration,
                    target, "First clip already within target duration, not trimming"
                );
                trimmed.discard().await;
                Ok(())
            }
            Err(e) => {
                trimmed.discard().await;
                Err(match e {
                    MediaError::DurationUnavailable { .. } => PipelineError::TrimDurationUnavailable,
                    other => PipelineError::render(Stage::Trimming, Some(1), other),
                })
            }
        }
    }
}
