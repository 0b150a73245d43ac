//! Media metadata and kind detection.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Extensions treated as still images.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Extensions accepted as video sources.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "m4v", "webm", "mkv"];

/// Whether the asset is a still image or a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Classify a file by its extension. Unknown extensions are treated as video.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        match extension_of(path.as_ref()) {
            Some(ext) if IMAGE_EXTENSIONS.contains(&ext.as_str()) => MediaKind::Image,
            _ => MediaKind::Video,
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, MediaKind::Image)
    }
}

/// Whether the file extension is one the pipeline can process.
pub fn is_supported_extension(path: impl AsRef<Path>) -> bool {
    match extension_of(path.as_ref()) {
        Some(ext) => {
            IMAGE_EXTENSIONS.contains(&ext.as_str()) || VIDEO_EXTENSIONS.contains(&ext.as_str())
        }
        None => false,
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Structural metadata of a media file.
///
/// Every field is optional: a failed probe yields `MediaMetadata::default()`
/// and callers skip whatever depends on the missing value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaMetadata {
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Duration in seconds
    pub duration: Option<f64>,
    pub has_audio: bool,
}

impl MediaMetadata {
    /// True when nothing could be determined.
    pub fn is_unknown(&self) -> bool {
        self.width.is_none() && self.height.is_none() && self.duration.is_none() && !self.has_audio
    }

    /// Both dimensions, when known.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.width.zip(self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(MediaKind::from_path("/tmp/a.JPG"), MediaKind::Image);
        assert_eq!(MediaKind::from_path("/tmp/a.png"), MediaKind::Image);
        assert_eq!(MediaKind::from_path("/tmp/a.mp4"), MediaKind::Video);
        assert_eq!(MediaKind::from_path("/tmp/noext"), MediaKind::Video);
    }

    #[test]
    fn test_supported_extensions() {
        assert!(is_supported_extension("clip.MOV"));
        assert!(is_supported_extension("photo.jpeg"));
        assert!(!is_supported_extension("notes.txt"));
        assert!(!is_supported_extension("README"));
    }

    #[test]
    fn test_unknown_metadata() {
        assert!(MediaMetadata::default().is_unknown());
        let m = MediaMetadata {
            width: Some(1920),
            height: Some(1080),
            ..Default::default()
        };
        assert!(!m.is_unknown());
        assert_eq!(m.dimensions(), Some((1920, 1080)));
    }
}
