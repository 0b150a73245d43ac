//! Text style descriptor and its positional enums.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Anchor position of the text block on the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Position {
    #[default]
    Center,
    TopLeft,
    TopRight,
    TopCenter,
    BottomLeft,
    BottomRight,
    BottomCenter,
    MiddleLeft,
    MiddleRight,
    /// Explicit pixel coordinates (`custom_x`, `custom_y`)
    Custom,
}

impl Position {
    /// All named anchors (excludes `Custom`).
    pub const NAMED: &'static [Position] = &[
        Position::Center,
        Position::TopLeft,
        Position::TopRight,
        Position::TopCenter,
        Position::BottomLeft,
        Position::BottomRight,
        Position::BottomCenter,
        Position::MiddleLeft,
        Position::MiddleRight,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Position::Center => "center",
            Position::TopLeft => "top-left",
            Position::TopRight => "top-right",
            Position::TopCenter => "top-center",
            Position::BottomLeft => "bottom-left",
            Position::BottomRight => "bottom-right",
            Position::BottomCenter => "bottom-center",
            Position::MiddleLeft => "middle-left",
            Position::MiddleRight => "middle-right",
            Position::Custom => "custom",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Horizontal alignment of lines inside the text block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    Left,
    #[default]
    Center,
    Right,
}

impl Alignment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
        }
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fully resolved text style.
///
/// Produced by merging a template with an optional override set. Every field
/// is populated; optional fields mean "feature disabled", not "unknown".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StyleDescriptor {
    /// Font file passed to the renderer
    #[schemars(with = "String")]
    pub font_path: PathBuf,
    /// Font size in pixels, relative to a 1080px wide frame
    pub font_size: u32,
    /// Font weight class (100-900)
    pub font_weight: u16,
    /// Text color (hex or named)
    pub text_color: String,
    /// Border (outline) width in pixels, 0 disables the border
    pub border_width: u32,
    pub border_color: String,
    pub shadow_x: i32,
    pub shadow_y: i32,
    pub shadow_color: String,
    pub background_enabled: bool,
    pub background_color: String,
    pub background_opacity: f32,
    pub text_opacity: f32,
    pub position: Position,
    /// Required when `position` is `custom`
    pub custom_x: Option<u32>,
    pub custom_y: Option<u32>,
    /// Line alignment, left to the renderer when unset
    #[serde(default)]
    pub alignment: Option<Alignment>,
    /// Wrap width as a percentage of the frame width (10-100)
    pub max_text_width_percent: Option<u8>,
    /// Extra pixels between lines, negative tightens
    pub line_spacing: i32,
    /// Seconds before the end of the clip at which the text disappears
    pub fade_out_before_end: Option<f64>,
}

impl StyleDescriptor {
    /// Explicit coordinates for a `custom` anchor, if both are present.
    pub fn custom_coordinates(&self) -> Option<(u32, u32)> {
        match (self.position, self.custom_x, self.custom_y) {
            (Position::Custom, Some(x), Some(y)) => Some((x, y)),
            _ => None,
        }
    }
}
