//! Merge and single-overlay request models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::overrides::OverrideSet;
use crate::template::DEFAULT_TEMPLATE_NAME;

fn default_template() -> String {
    DEFAULT_TEMPLATE_NAME.to_string()
}

/// One clip of a merge batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClipJob {
    /// Source URL of the clip
    pub url: String,
    /// Text to overlay
    pub text: String,
    /// Style template name
    #[serde(default = "default_template")]
    pub template: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overrides: Option<OverrideSet>,
}

impl ClipJob {
    pub fn new(url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            text: text.into(),
            template: default_template(),
            overrides: None,
        }
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    pub fn with_overrides(mut self, overrides: OverrideSet) -> Self {
        self.overrides = Some(overrides);
        self
    }

    /// Whether this clip carries a non-empty override set.
    pub fn has_overrides(&self) -> bool {
        self.overrides.as_ref().is_some_and(|o| !o.is_empty())
    }
}

/// Where to cut time from when shortening the first clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum TrimMode {
    /// Remove from the beginning, keep the tail
    Start,
    /// Remove from the end, keep the head
    End,
    /// Remove equally from both ends
    #[default]
    Both,
}

impl fmt::Display for TrimMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TrimMode::Start => "start",
            TrimMode::End => "end",
            TrimMode::Both => "both",
        })
    }
}

/// Container of a merged output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutputContainer {
    #[default]
    Mp4,
    Mov,
}

impl OutputContainer {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputContainer::Mp4 => "mp4",
            OutputContainer::Mov => "mov",
        }
    }
}

/// Batch request: overlay text on every clip, then concatenate them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MergeRequest {
    pub clips: Vec<ClipJob>,
    #[serde(default)]
    pub output_format: OutputContainer,
    /// Target duration in seconds for the first clip
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_clip_duration: Option<f64>,
    #[serde(default)]
    pub first_clip_trim_mode: TrimMode,
}

impl MergeRequest {
    pub fn new(clips: Vec<ClipJob>) -> Self {
        Self {
            clips,
            output_format: OutputContainer::default(),
            first_clip_duration: None,
            first_clip_trim_mode: TrimMode::default(),
        }
    }

    pub fn with_first_clip_trim(mut self, duration: f64, mode: TrimMode) -> Self {
        self.first_clip_duration = Some(duration);
        self.first_clip_trim_mode = mode;
        self
    }

    /// Whether any clip supplies overrides.
    pub fn has_overrides(&self) -> bool {
        self.clips.iter().any(ClipJob::has_overrides)
    }
}

/// Output format of a single overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Keep the source extension
    #[default]
    Same,
    Mp4,
    Jpg,
    Png,
}

impl OutputFormat {
    /// Extension to use for the output, given the source extension.
    pub fn extension<'a>(&self, source_ext: &'a str) -> &'a str {
        match self {
            OutputFormat::Same => source_ext,
            OutputFormat::Mp4 => "mp4",
            OutputFormat::Jpg => "jpg",
            OutputFormat::Png => "png",
        }
    }
}

/// Single asset overlay request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OverlayRequest {
    pub url: String,
    pub text: String,
    #[serde(default = "default_template")]
    pub template: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overrides: Option<OverrideSet>,
    #[serde(default)]
    pub output_format: OutputFormat,
}

impl OverlayRequest {
    pub fn new(url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            text: text.into(),
            template: default_template(),
            overrides: None,
            output_format: OutputFormat::default(),
        }
    }
}
