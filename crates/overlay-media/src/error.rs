//! Errors raised by probing and rendering.

use std::path::PathBuf;
use thiserror::Error;

pub type MediaResult<T> = Result<T, MediaError>;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("ffmpeg binary not found on PATH")]
    FfmpegNotFound,

    #[error("ffprobe binary not found on PATH")]
    FfprobeNotFound,

    /// The renderer exited with a non-zero status.
    #[error("Render failed: {message}")]
    RenderFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    /// The renderer exceeded its time budget and was killed.
    #[error("FFmpeg timed out after {0} seconds")]
    RenderTimeout(u64),

    /// The renderer exited cleanly but left no usable output.
    #[error("Output file was not created: {0}")]
    RenderIncomplete(PathBuf),

    #[error("Probe failed: {message}")]
    FfprobeFailed {
        message: String,
        stderr: Option<String>,
    },

    /// A clip needs silent audio but its duration could not be probed.
    #[error("Duration unknown for input {index}: cannot synthesize matching silent audio")]
    DurationUnavailable { index: usize },

    #[error("Input does not exist: {0}")]
    FileNotFound(PathBuf),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unreadable ffprobe output: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl MediaError {
    pub fn render_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::RenderFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Whether this error came from the rendering engine itself.
    pub fn is_render_error(&self) -> bool {
        matches!(
            self,
            MediaError::RenderFailed { .. }
                | MediaError::RenderTimeout(_)
                | MediaError::RenderIncomplete(_)
        )
    }

    /// Captured diagnostic output, if any.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            MediaError::RenderFailed { stderr, .. } | MediaError::FfprobeFailed { stderr, .. } => {
                stderr.as_deref()
            }
            _ => None,
        }
    }
}
