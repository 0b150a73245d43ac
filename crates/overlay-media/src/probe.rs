//! FFprobe media metadata.
//!
//! Probing never fails the caller: any inspection error is logged and an
//! empty [`MediaMetadata`] is returned, so callers skip whatever depends on
//! the missing field instead of aborting.

use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

use overlay_models::MediaMetadata;

use crate::error::{MediaError, MediaResult};

/// Default time budget for a single ffprobe call.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
}

/// Metadata inspector backed by the `ffprobe` CLI.
#[derive(Debug, Clone)]
pub struct MediaProbe {
    program: String,
    timeout: Duration,
}

impl Default for MediaProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaProbe {
    pub fn new() -> Self {
        Self {
            program: "ffprobe".to_string(),
            timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    /// Use a different executable.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Probe a file, returning empty metadata on any failure.
    pub async fn probe(&self, path: impl AsRef<Path>) -> MediaMetadata {
        let path = path.as_ref();
        match self.try_probe(path).await {
            Ok(metadata) => {
                debug!(
                    path = %path.display(),
                    width = ?metadata.width,
                    height = ?metadata.height,
                    duration = ?metadata.duration,
                    has_audio = metadata.has_audio,
                    "Probed media"
                );
                metadata
            }
            Err(e) => {
                warn!(path = %path.display(), "Failed to get media info: {}", e);
                MediaMetadata::default()
            }
        }
    }

    /// Probe a file, surfacing errors.
    pub async fn try_probe(&self, path: &Path) -> MediaResult<MediaMetadata> {
        if !path.exists() {
            return Err(MediaError::FileNotFound(path.to_path_buf()));
        }

        let program = which::which(&self.program).map_err(|_| MediaError::FfprobeNotFound)?;

        let mut command = Command::new(program);
        command
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| MediaError::FfprobeFailed {
                message: format!("FFprobe timed out after {} seconds", self.timeout.as_secs()),
                stderr: None,
            })??;

        if !output.status.success() {
            return Err(MediaError::FfprobeFailed {
                message: "FFprobe failed".to_string(),
                stderr: Some(String::from_utf8_lossy(&output.stderr).to_string()),
            });
        }

        parse_ffprobe_json(&output.stdout)
    }
}

/// Probe with the default `ffprobe` on PATH. Never fails.
pub async fn probe_media(path: impl AsRef<Path>) -> MediaMetadata {
    MediaProbe::new().probe(path).await
}

/// Extract metadata from ffprobe's JSON output.
pub fn parse_ffprobe_json(bytes: &[u8]) -> MediaResult<MediaMetadata> {
    let probe: FfprobeOutput = serde_json::from_slice(bytes)?;

    let video = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"));

    let has_audio = probe
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    // Container duration first, then the video stream's own
    let duration = probe
        .format
        .as_ref()
        .and_then(|f| parse_duration(f.duration.as_deref()))
        .or_else(|| video.and_then(|v| parse_duration(v.duration.as_deref())));

    Ok(MediaMetadata {
        width: video.and_then(|v| v.width).filter(|w| *w > 0),
        height: video.and_then(|v| v.height).filter(|h| *h > 0),
        duration,
        has_audio,
    })
}

fn parse_duration(value: Option<&str>) -> Option<f64> {
    value
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
}
