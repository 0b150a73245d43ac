//! Pipeline error types.

use std::fmt;
use thiserror::Error;

use overlay_media::MediaError;

pub type PipelineResult<T> = Result<T, PipelineError>;

/// States of a merge request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Validating,
    Downloading,
    Overlaying,
    Trimming,
    Concatenating,
    Done,
    Failed,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Validating => "validating",
            Stage::Downloading => "downloading",
            Stage::Overlaying => "overlaying",
            Stage::Trimming => "trimming",
            Stage::Concatenating => "concatenating",
            Stage::Done => "done",
            Stage::Failed => "failed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clip suffix for error messages. Clip numbers are 1-based.
fn clip_label(clip: &Option<usize>) -> String {
    match clip {
        Some(clip) => format!(" (clip {clip})"),
        None => String::new(),
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Download failed{}: {message}", clip_label(.clip))]
    Download {
        clip: Option<usize>,
        message: String,
    },

    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Unsupported media{}: {message}", clip_label(.clip))]
    UnsupportedMedia {
        clip: Option<usize>,
        message: String,
    },

    /// A render step failed; `source` is `RenderFailed`, `RenderTimeout`
    /// or `RenderIncomplete` for renderer problems.
    #[error("Render failed while {stage}{}: {source}", clip_label(.clip))]
    Render {
        stage: Stage,
        clip: Option<usize>,
        #[source]
        source: MediaError,
    },

    #[error("Cannot trim clip 1: its duration could not be determined")]
    TrimDurationUnavailable,

    #[error("Cannot concatenate: duration of clip {clip} is unknown and it needs silent audio")]
    DurationUnavailable { clip: usize },

    #[error("Background removal failed: {0}")]
    BackgroundRemoval(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn download(clip: Option<usize>, msg: impl Into<String>) -> Self {
        Self::Download {
            clip,
            message: msg.into(),
        }
    }

    pub fn unsupported_media(clip: Option<usize>, msg: impl Into<String>) -> Self {
        Self::UnsupportedMedia {
            clip,
            message: msg.into(),
        }
    }

    pub fn render(stage: Stage, clip: Option<usize>, source: MediaError) -> Self {
        Self::Render {
            stage,
            clip,
            source,
        }
    }

    pub fn background_removal(msg: impl Into<String>) -> Self {
        Self::BackgroundRemoval(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Attribute a clip-less error to `clip`.
    pub fn for_clip(self, clip: usize) -> Self {
        match self {
            PipelineError::Download { message, .. } => PipelineError::Download {
                clip: Some(clip),
                message,
            },
            PipelineError::UnsupportedMedia { message, .. } => PipelineError::UnsupportedMedia {
                clip: Some(clip),
                message,
            },
            PipelineError::Render { stage, source, .. } => PipelineError::Render {
                stage,
                clip: Some(clip),
                source,
            },
            PipelineError::Io(e) => PipelineError::download(Some(clip), e.to_string()),
            other => other,
        }
    }

    /// Stage the failure happened in, when it is tied to one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineError::Validation(_) => Some(Stage::Validating),
            PipelineError::Download { .. } => Some(Stage::Downloading),
            PipelineError::Render { stage, .. } => Some(*stage),
            PipelineError::TrimDurationUnavailable => Some(Stage::Trimming),
            PipelineError::DurationUnavailable { .. } => Some(Stage::Concatenating),
            _ => None,
        }
    }

    /// 1-based clip number the failure is attributed to.
    pub fn clip(&self) -> Option<usize> {
        match self {
            PipelineError::Download { clip, .. }
            | PipelineError::UnsupportedMedia { clip, .. }
            | PipelineError::Render { clip, .. } => *clip,
            PipelineError::TrimDurationUnavailable => Some(1),
            PipelineError::DurationUnavailable { clip } => Some(*clip),
            _ => None,
        }
    }

    /// Whether the caller sent something unusable (as opposed to a
    /// processing failure).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PipelineError::Validation(_)
                | PipelineError::TemplateNotFound(_)
                | PipelineError::UnsupportedMedia { .. }
        )
    }
}
