//! Composite operations over a [`MediaEngine`].
//!
//! These tie probing, layout and filter building to a render call. They own
//! no files except the drawtext side-channel, which is removed on every exit
//! path when its guard drops.

use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use overlay_models::{StyleDescriptor, TrimMode};

use crate::error::{MediaError, MediaResult};
use crate::filters::{build_concat_filter, build_drawtext_filter, ConcatInput};
use crate::layout::layout_text;
use crate::render::{MediaEngine, OverlayTarget, RenderResult};
use crate::trim::plan_trim;

/// Result of a first-clip trim request.
#[derive(Debug, Clone, PartialEq)]
pub enum TrimOutcome {
    Trimmed(RenderResult),
    /// The clip was already no longer than the target
    Unchanged { duration: f64 },
}

/// Overlay `text` on `input` using `style`, writing `output`.
pub async fn apply_text_overlay(
    engine: &dyn MediaEngine,
    input: &Path,
    output: &Path,
    text: &str,
    style: &StyleDescriptor,
    target: OverlayTarget,
) -> MediaResult<RenderResult> {
    let mut media = engine.probe(input).await;
    // A still rendered as a clip has the length of that clip
    if let OverlayTarget::StillAsVideo { seconds } = target {
        media.duration = Some(seconds);
    }
    let layout = layout_text(text, style, &media);

    debug!(
        input = %input.display(),
        font_size = layout.font_size,
        lines = layout.line_count(),
        "Laid out overlay text"
    );

    let text_dir = output.parent().unwrap_or_else(|| Path::new("."));
    let text_file = tempfile::Builder::new()
        .prefix("text_")
        .suffix(".txt")
        .tempfile_in(text_dir)?;

    let mut handle = tokio::fs::File::create(text_file.path()).await?;
    handle.write_all(layout.text.as_bytes()).await?;
    handle.flush().await?;
    drop(handle);

    let filter = build_drawtext_filter(style, layout.font_size, text_file.path(), &media);
    engine.render_overlay(input, output, &filter, target).await
}

/// Concatenate `inputs` in order into `output`.
pub async fn merge_clips(
    engine: &dyn MediaEngine,
    inputs: &[PathBuf],
    output: &Path,
) -> MediaResult<RenderResult> {
    let mut described = Vec::with_capacity(inputs.len());
    for path in inputs {
        described.push(ConcatInput::from(&engine.probe(path).await));
    }

    let filter = build_concat_filter(&described)?;
    info!(
        clips = inputs.len(),
        has_audio = filter.has_audio,
        "Concatenating clips"
    );

    engine.render_concat(inputs, output, &filter).await
}

/// Trim `input` to `target` seconds according to `mode`.
///
/// Fails with [`MediaError::DurationUnavailable`] when the duration cannot
/// be probed.
pub async fn trim_clip(
    engine: &dyn MediaEngine,
    input: &Path,
    output: &Path,
    target: f64,
    mode: TrimMode,
) -> MediaResult<TrimOutcome> {
    let duration = engine
        .probe(input)
        .await
        .duration
        .ok_or(MediaError::DurationUnavailable { index: 1 })?;

    match plan_trim(duration, target, mode) {
        Some(window) => {
            info!(
                source_duration = duration,
                start = window.start,
                duration = window.duration,
                mode = %mode,
                "Trimming clip"
            );
            let result = engine.render_trim(input, output, window).await?;
            Ok(TrimOutcome::Trimmed(result))
        }
        None => Ok(TrimOutcome::Unchanged { duration }),
    }
}
