//! Concatenation (`filter_complex`) graph.
//!
//! Every input is normalized to a common frame rate, pixel format and sample
//! aspect ratio before the concat filter sees it. When all dimensions are
//! known, inputs are also letterboxed onto the first clip's canvas.

use overlay_models::encoding::{
    NORMALIZED_CHANNEL_LAYOUT, NORMALIZED_FPS, NORMALIZED_PIX_FMT, NORMALIZED_SAMPLE_RATE,
};
use overlay_models::MediaMetadata;

use crate::error::{MediaError, MediaResult};

/// What the graph needs to know about one input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConcatInput {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub duration: Option<f64>,
    pub has_audio: bool,
}

impl From<&MediaMetadata> for ConcatInput {
    fn from(meta: &MediaMetadata) -> Self {
        Self {
            width: meta.width,
            height: meta.height,
            duration: meta.duration,
            has_audio: meta.has_audio,
        }
    }
}

/// A built concatenation graph and the output pads to map.
#[derive(Debug, Clone, PartialEq)]
pub struct ConcatFilter {
    pub filter_complex: String,
    pub maps: Vec<String>,
    /// Whether the output carries an audio stream
    pub has_audio: bool,
}

/// Build the graph for `inputs`, in order.
///
/// Audio policy:
/// - every input has audio: each stream is resampled and concatenated
/// - no input has audio: video-only output
/// - mixed: inputs without audio get silence trimmed to their duration,
///   which must be known
pub fn build_concat_filter(inputs: &[ConcatInput]) -> MediaResult<ConcatFilter> {
    if inputs.is_empty() {
        return Err(MediaError::invalid_input("No inputs to concatenate"));
    }

    let with_audio = inputs.iter().filter(|i| i.has_audio).count();
    let emit_audio = with_audio > 0;
    let canvas = common_canvas(inputs);

    let mut chains = Vec::with_capacity(inputs.len() * 2 + 1);
    let mut concat_pads = String::new();

    for (idx, input) in inputs.iter().enumerate() {
        chains.push(video_chain(idx, canvas));
        concat_pads.push_str(&format!("[v{idx}]"));

        if emit_audio {
            let chain = if input.has_audio {
                resample_chain(idx)
            } else {
                let duration = input
                    .duration
                    .ok_or(MediaError::DurationUnavailable { index: idx + 1 })?;
                silence_chain(idx, duration)
            };
            chains.push(chain);
            concat_pads.push_str(&format!("[a{idx}]"));
        }
    }

    let n = inputs.len();
    let (concat, maps) = if emit_audio {
        (
            format!("{concat_pads}concat=n={n}:v=1:a=1[outv][outa]"),
            vec!["[outv]".to_string(), "[outa]".to_string()],
        )
    } else {
        (
            format!("{concat_pads}concat=n={n}:v=1:a=0[outv]"),
            vec!["[outv]".to_string()],
        )
    };
    chains.push(concat);

    Ok(ConcatFilter {
        filter_complex: chains.join(";"),
        maps,
        has_audio: emit_audio,
    })
}

/// First clip's dimensions, rounded down to even, if every input is known.
fn common_canvas(inputs: &[ConcatInput]) -> Option<(u32, u32)> {
    if inputs
        .iter()
        .any(|i| i.width.is_none() || i.height.is_none())
    {
        return None;
    }
    let first = inputs.first()?;
    let (w, h) = (first.width? & !1, first.height? & !1);
    (w > 0 && h > 0).then_some((w, h))
}

fn video_chain(idx: usize, canvas: Option<(u32, u32)>) -> String {
    let normalize = format!("fps={NORMALIZED_FPS},format={NORMALIZED_PIX_FMT},setsar=1");
    match canvas {
        Some((w, h)) => format!(
            "[{idx}:v]scale={w}:{h}:force_original_aspect_ratio=decrease,\
             pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,{normalize}[v{idx}]"
        ),
        None => format!("[{idx}:v]{normalize}[v{idx}]"),
    }
}

fn resample_chain(idx: usize) -> String {
    format!(
        "[{idx}:a]aresample={NORMALIZED_SAMPLE_RATE},\
         aformat=sample_rates={NORMALIZED_SAMPLE_RATE}:channel_layouts={NORMALIZED_CHANNEL_LAYOUT}[a{idx}]"
    )
}

fn silence_chain(idx: usize, duration: f64) -> String {
    format!(
        "anullsrc=channel_layout={NORMALIZED_CHANNEL_LAYOUT}:sample_rate={NORMALIZED_SAMPLE_RATE},\
         atrim=duration={duration:.3}[a{idx}]"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(has_audio: bool, duration: Option<f64>) -> ConcatInput {
        ConcatInput {
            width: Some(1080),
            height: Some(1920),
            duration,
            has_audio,
        }
    }

    #[test]
    fn test_mixed_audio_synthesizes_silence_once() {
        let inputs = [
            input(true, Some(6.0)),
            input(false, Some(4.25)),
            input(true, Some(8.0)),
        ];
        let filter = build_concat_filter(&inputs).unwrap();

        assert_eq!(filter.filter_complex.matches("anullsrc").count(), 1);
        assert!(filter
            .filter_complex
            .contains("anullsrc=channel_layout=stereo:sample_rate=44100,atrim=duration=4.250[a1]"));
        assert!(filter.filter_complex.contains("[0:a]aresample=44100"));
        assert!(filter.filter_complex.contains("[2:a]aresample=44100"));
        assert!(!filter.filter_complex.contains("[1:a]"));
        assert!(filter
            .filter_complex
            .ends_with("[v0][a0][v1][a1][v2][a2]concat=n=3:v=1:a=1[outv][outa]"));
        assert_eq!(filter.maps, vec!["[outv]", "[outa]"]);
        assert!(filter.has_audio);
    }

    #[test]
    fn test_all_audio() {
        let inputs = [input(true, None), input(true, None)];
        let filter = build_concat_filter(&inputs).unwrap();
        assert!(!filter.filter_complex.contains("anullsrc"));
        assert!(filter.filter_complex.contains("concat=n=2:v=1:a=1"));
    }

    #[test]
    fn test_no_audio_is_video_only() {
        let inputs = [input(false, None), input(false, Some(3.0))];
        let filter = build_concat_filter(&inputs).unwrap();
        assert!(!filter.filter_complex.contains("anullsrc"));
        assert!(!filter.filter_complex.contains(":a]"));
        assert!(filter.filter_complex.ends_with("[v0][v1]concat=n=2:v=1:a=0[outv]"));
        assert_eq!(filter.maps, vec!["[outv]"]);
        assert!(!filter.has_audio);
    }

    #[test]
    fn test_mixed_with_unknown_duration_fails() {
        let inputs = [input(true, Some(5.0)), input(false, None)];
        match build_concat_filter(&inputs) {
            Err(MediaError::DurationUnavailable { index }) => assert_eq!(index, 2),
            other => panic!("expected DurationUnavailable, got {other:?}"),
        }
    }

    #[test]
    fn test_every_input_normalized() {
        let inputs = [input(false, None), input(false, None), input(false, None)];
        let filter = build_concat_filter(&inputs).unwrap();
        assert_eq!(
            filter
                .filter_complex
                .matches("fps=30,format=yuv420p,setsar=1")
                .count(),
            3
        );
    }

    #[test]
    fn test_scaled_onto_first_canvas() {
        let mut second = input(false, None);
        second.width = Some(1921);
        second.height = Some(1081);
        let inputs = [input(false, None), second];
        let filter = build_concat_filter(&inputs).unwrap();
        assert!(filter
            .filter_complex
            .contains("[1:v]scale=1080:1920:force_original_aspect_ratio=decrease,pad=1080:1920"));
    }

    #[test]
    fn test_unknown_dimensions_skip_scaling() {
        let mut second = input(false, None);
        second.width = None;
        let filter = build_concat_filter(&[input(false, None), second]).unwrap();
        assert!(!filter.filter_complex.contains("scale="));
        assert!(filter.filter_complex.starts_with("[0:v]fps=30"));
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(matches!(
            build_concat_filter(&[]),
            Err(MediaError::InvalidInput(_))
        ));
    }
}
