//! Render invocation: FFmpeg encode settings, timeouts and output checks.
//!
//! [`MediaEngine`] is the seam between the pipeline and the external
//! renderer. [`FfmpegEngine`] is the production implementation; tests swap
//! in fakes that write files directly.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, warn};

use overlay_models::{EncodingConfig, MediaMetadata};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::filters::ConcatFilter;
use crate::probe::{MediaProbe, DEFAULT_PROBE_TIMEOUT};
use crate::trim::TrimWindow;

/// Time budget for one overlay (and trim) render.
pub const DEFAULT_OVERLAY_TIMEOUT: Duration = Duration::from_secs(120);

/// Time budget for the concatenation render.
pub const DEFAULT_CONCAT_TIMEOUT: Duration = Duration::from_secs(600);

/// Length of the video produced from a still image when it joins a merge.
pub const STILL_CLIP_SECONDS: f64 = 3.0;

/// Histogram of render wall time, labelled by stage.
pub const RENDER_DURATION_METRIC: &str = "overlay_render_duration_seconds";

/// What an overlay render should produce.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OverlayTarget {
    /// Single high quality frame
    Still,
    /// Re-encoded video, audio carried through
    Video,
    /// A still image looped into a silent video of the given length
    StillAsVideo { seconds: f64 },
}

/// Renderer settings.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub encoding: EncodingConfig,
    pub overlay_timeout: Duration,
    pub concat_timeout: Duration,
    pub probe_timeout: Duration,
    pub ffmpeg_program: String,
    pub ffprobe_program: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            encoding: EncodingConfig::default(),
            overlay_timeout: DEFAULT_OVERLAY_TIMEOUT,
            concat_timeout: DEFAULT_CONCAT_TIMEOUT,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            ffmpeg_program: "ffmpeg".to_string(),
            ffprobe_program: "ffprobe".to_string(),
        }
    }
}

/// A verified render output.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderResult {
    pub path: PathBuf,
    pub size: u64,
    /// Probed duration, only filled for concatenation outputs
    pub duration: Option<f64>,
}

/// Rendering engine and metadata inspector.
#[async_trait]
pub trait MediaEngine: Send + Sync {
    /// Inspect a file. Never fails; unknown fields stay `None`.
    async fn probe(&self, path: &Path) -> MediaMetadata;

    /// Apply a single-input video filter.
    async fn render_overlay(
        &self,
        input: &Path,
        output: &Path,
        filter: &str,
        target: OverlayTarget,
    ) -> MediaResult<RenderResult>;

    /// Cut `window` out of `input`, dropping audio.
    async fn render_trim(
        &self,
        input: &Path,
        output: &Path,
        window: TrimWindow,
    ) -> MediaResult<RenderResult>;

    /// Join `inputs` in order with a prepared concat graph.
    async fn render_concat(
        &self,
        inputs: &[PathBuf],
        output: &Path,
        filter: &ConcatFilter,
    ) -> MediaResult<RenderResult>;
}

/// [`MediaEngine`] backed by the `ffmpeg` and `ffprobe` CLIs.
#[derive(Debug, Clone, Default)]
pub struct FfmpegEngine {
    config: RenderConfig,
}

impl FfmpegEngine {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    fn runner(&self, timeout: Duration) -> FfmpegRunner {
        FfmpegRunner::new()
            .with_program(self.config.ffmpeg_program.clone())
            .with_timeout(timeout)
    }

    fn prober(&self) -> MediaProbe {
        MediaProbe::new()
            .with_program(self.config.ffprobe_program.clone())
            .with_timeout(self.config.probe_timeout)
    }

    fn video_encode(&self, cmd: FfmpegCommand) -> FfmpegCommand {
        let enc = &self.config.encoding;
        let cmd = cmd
            .video_codec(enc.video_codec.clone())
            .preset(enc.preset.clone())
            .crf(enc.crf);
        if enc.faststart {
            cmd.faststart()
        } else {
            cmd
        }
    }

    async fn run_timed(
        &self,
        stage: &'static str,
        cmd: &FfmpegCommand,
        timeout: Duration,
    ) -> MediaResult<RenderResult> {
        let start = Instant::now();
        let result = self.runner(timeout).run(cmd).await;
        let elapsed = start.elapsed().as_secs_f64();

        metrics::histogram!(RENDER_DURATION_METRIC, "stage" => stage).record(elapsed);

        if let Err(e) = result {
            warn!(stage, elapsed_secs = elapsed, "Render failed: {}", e);
            return Err(e);
        }

        let output = verify_output(cmd.output_path()).await?;
        info!(
            stage,
            output = %output.path.display(),
            size = output.size,
            elapsed_secs = elapsed,
            "Render complete"
        );
        Ok(output)
    }
}

#[async_trait]
impl MediaEngine for FfmpegEngine {
    async fn probe(&self, path: &Path) -> MediaMetadata {
        self.prober().probe(path).await
    }

    async fn render_overlay(
        &self,
        input: &Path,
        output: &Path,
        filter: &str,
        target: OverlayTarget,
    ) -> MediaResult<RenderResult> {
        let enc = &self.config.encoding;

        let cmd = match target {
            OverlayTarget::Still => FfmpegCommand::new(input, output)
                .video_filter(filter)
                .single_frame()
                .quality(enc.still_quality),
            OverlayTarget::Video => self
                .video_encode(FfmpegCommand::new(input, output).video_filter(filter))
                .audio_codec(enc.audio_codec.clone())
                .audio_bitrate(enc.audio_bitrate.clone()),
            OverlayTarget::StillAsVideo { seconds } => self
                .video_encode(
                    FfmpegCommand::without_inputs(output)
                        .input(input)
                        .input_arg("-loop")
                        .input_arg("1")
                        .duration(seconds)
                        .video_filter(format!("{filter},format=yuv420p")),
                )
                .no_audio(),
        };

        self.run_timed("overlay", &cmd, self.config.overlay_timeout)
            .await
    }

    async fn render_trim(
        &self,
        input: &Path,
        output: &Path,
        window: TrimWindow,
    ) -> MediaResult<RenderResult> {
        let cmd = self
            .video_encode(
                FfmpegCommand::new(input, output)
                    .seek(window.start)
                    .duration(window.duration),
            )
            .no_audio();

        self.run_timed("trim", &cmd, self.config.overlay_timeout)
            .await
    }

    async fn render_concat(
        &self,
        inputs: &[PathBuf],
        output: &Path,
        filter: &ConcatFilter,
    ) -> MediaResult<RenderResult> {
        if inputs.is_empty() {
            return Err(MediaError::invalid_input("No inputs to concatenate"));
        }

        let enc = &self.config.encoding;
        let mut cmd = inputs
            .iter()
            .fold(FfmpegCommand::without_inputs(output), |cmd, path| {
                cmd.input(path)
            })
            .filter_complex(filter.filter_complex.clone());
        for label in &filter.maps {
            cmd = cmd.map(label.clone());
        }
        cmd = self.video_encode(cmd);
        if filter.has_audio {
            cmd = cmd
                .audio_codec(enc.audio_codec.clone())
                .audio_bitrate(enc.audio_bitrate.clone());
        }

        let mut result = self
            .run_timed("concat", &cmd, self.config.concat_timeout)
            .await?;
        result.duration = self.probe(&result.path).await.duration;
        Ok(result)
    }
}

/// Confirm the renderer left a non-empty file behind.
pub async fn verify_output(path: &Path) -> MediaResult<RenderResult> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() && meta.len() > 0 => Ok(RenderResult {
            path: path.to_path_buf(),
            size: meta.len(),
            duration: None,
        }),
        _ => Err(MediaError::RenderIncomplete(path.to_path_buf())),
    }
}
