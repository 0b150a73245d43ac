//! FFmpeg filter definitions.
//!
//! `drawtext` builds the text overlay directive for a single input,
//! `concat` builds the `filter_complex` graph that joins several clips.

pub mod concat;
pub mod drawtext;

pub use concat::{build_concat_filter, ConcatFilter, ConcatInput};
pub use drawtext::{anchor_expressions, build_drawtext_filter, fade_alpha_expr, to_ffmpeg_color};

/// Escape a filesystem path for use as a filter option value.
pub fn escape_filter_path(path: &str) -> String {
    path.replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace(':', "\\:")
}
