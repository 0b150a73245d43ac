//! Output encoding settings and the normalization targets used before
//! concatenation.

use serde::{Deserialize, Serialize};

pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
pub const DEFAULT_AUDIO_CODEC: &str = "aac";
pub const DEFAULT_PRESET: &str = "medium";
pub const DEFAULT_CRF: u8 = 23;
pub const DEFAULT_AUDIO_BITRATE: &str = "128k";
/// `-q:v` for JPEG/PNG stills, 2 is near lossless
pub const DEFAULT_STILL_QUALITY: u8 = 2;

pub const NORMALIZED_FPS: u32 = 30;
pub const NORMALIZED_PIX_FMT: &str = "yuv420p";
/// Applies to real and synthesized audio alike.
pub const NORMALIZED_SAMPLE_RATE: u32 = 44_100;
pub const NORMALIZED_CHANNEL_LAYOUT: &str = "stereo";

/// How overlays, trims and merges are encoded.
///
/// Missing JSON fields take the defaults above.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodingConfig {
    pub video_codec: String,
    pub preset: String,
    /// 0-51, lower is better
    pub crf: u8,
    pub audio_codec: String,
    pub audio_bitrate: String,
    pub still_quality: u8,
    /// Write the moov atom first so players can start before the download ends
    pub faststart: bool,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            video_codec: DEFAULT_VIDEO_CODEC.into(),
            preset: DEFAULT_PRESET.into(),
            crf: DEFAULT_CRF,
            audio_codec: DEFAULT_AUDIO_CODEC.into(),
            audio_bitrate: DEFAULT_AUDIO_BITRATE.into(),
            still_quality: DEFAULT_STILL_QUALITY,
            faststart: true,
        }
    }
}
