//! Text layout: proportional font scaling and greedy word wrapping.
//!
//! Wrapping is a character-count approximation. There is no glyph
//! measurement, so the average glyph width is estimated as a fixed fraction
//! of the font size. Wide glyphs or unusual fonts can overflow the target
//! width slightly; this is a known precision limit of the approach.

use overlay_models::{MediaMetadata, StyleDescriptor};

/// Frame width that template font sizes are authored against.
pub const REFERENCE_WIDTH: u32 = 1080;

/// Estimated average glyph width as a fraction of the font size.
pub const AVG_GLYPH_WIDTH_RATIO: f64 = 0.55;

/// Lower bound for the characters-per-line budget.
pub const MIN_CHARS_PER_LINE: usize = 10;

/// Text ready for rendering, with the font size it was laid out for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextLayout {
    pub text: String,
    pub font_size: u32,
}

impl TextLayout {
    pub fn line_count(&self) -> usize {
        self.text.split('\n').count()
    }
}

/// Scale a template font size to the actual media width.
///
/// `floor(base * width / 1080)`. Unknown width leaves the size unchanged.
pub fn scale_font_size(base_size: u32, media_width: Option<u32>) -> u32 {
    match media_width {
        Some(width) if width > 0 => {
            (u64::from(base_size) * u64::from(width) / u64::from(REFERENCE_WIDTH)) as u32
        }
        _ => base_size,
    }
}

/// Characters that fit on one line, never below [`MIN_CHARS_PER_LINE`].
pub fn max_chars_per_line(media_width: u32, max_width_percent: u8, font_size: u32) -> usize {
    let max_pixel_width = f64::from(media_width) * f64::from(max_width_percent) / 100.0;
    let avg_glyph_width = AVG_GLYPH_WIDTH_RATIO * f64::from(font_size);

    if avg_glyph_width <= 0.0 {
        return MIN_CHARS_PER_LINE.max(max_pixel_width as usize);
    }

    ((max_pixel_width / avg_glyph_width).floor() as usize).max(MIN_CHARS_PER_LINE)
}

/// Greedily pack words onto lines of at most `max_chars` characters.
///
/// Manual line breaks are hard paragraph boundaries; each paragraph wraps on
/// its own and empty paragraphs stay as empty lines. A word longer than
/// `max_chars` gets a line to itself.
pub fn wrap_text(text: &str, max_chars: usize) -> String {
    let normalized = text.replace('\r', "");
    let mut lines: Vec<String> = Vec::new();

    for paragraph in normalized.split('\n') {
        if paragraph.trim().is_empty() {
            lines.push(String::new());
            continue;
        }

        let mut current = String::new();
        let mut current_len = 0usize;

        for word in paragraph.split(' ').filter(|w| !w.is_empty()) {
            let word_len = word.chars().count();
            let candidate_len = if current.is_empty() {
                word_len
            } else {
                current_len + 1 + word_len
            };

            if candidate_len > max_chars && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
                current_len = word_len;
            } else {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(word);
                current_len = candidate_len;
            }
        }

        if !current.is_empty() {
            lines.push(current);
        }
    }

    lines.join("\n")
}

/// Lay out text for a style on media of the given shape.
///
/// Scales the font to the media width, then wraps at the style's width
/// percentage. Both steps are skipped when the width is unknown.
pub fn layout_text(text: &str, style: &StyleDescriptor, media: &MediaMetadata) -> TextLayout {
    let font_size = scale_font_size(style.font_size, media.width);

    let text = match (media.width, style.max_text_width_percent) {
        (Some(width), Some(percent)) if width > 0 => {
            wrap_text(text, max_chars_per_line(width, percent, font_size))
        }
        _ => text.to_string(),
    };

    TextLayout { text, font_size }
}
