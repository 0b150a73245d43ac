//! FFmpeg CLI wrapper for text overlays and clip merging.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building and a timeout-aware runner
//! - Media probing via ffprobe
//! - Text layout (font scaling, word wrapping)
//! - drawtext and concat filter construction
//! - Request-scoped temporary artifacts

pub mod artifact;
pub mod command;
pub mod error;
pub mod filters;
pub mod layout;
pub mod overlay;
pub mod probe;
pub mod render;
pub mod trim;

pub use artifact::TempArtifact;
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use filters::{build_concat_filter, build_drawtext_filter, ConcatFilter, ConcatInput};
pub use layout::{layout_text, TextLayout};
pub use overlay::{apply_text_overlay, merge_clips, trim_clip, TrimOutcome};
pub use probe::{probe_media, MediaProbe};
pub use render::{
    FfmpegEngine, MediaEngine, OverlayTarget, RenderConfig, RenderResult, STILL_CLIP_SECONDS,
};
pub use trim::{plan_trim, TrimWindow};
