//! Per-request style overrides.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::color::is_valid_color;
use crate::fonts::FontFamily;
use crate::style::{Alignment, Position};

/// Sparse set of style fields that supersede a template's values.
///
/// Every field is optional; only present fields are applied. `font_weight`
/// and the deprecated `font_family` both select the font asset, with
/// `font_weight` taking precedence when both are set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct OverrideSet {
    /// Deprecated, use `font_weight`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<FontFamily>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow_x: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow_y: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_opacity: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_opacity: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_x: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_y: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<Alignment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_text_width_percent: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_spacing: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fade_out_before_end: Option<f64>,
}

impl OverrideSet {
    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Validate field ranges and cross-field consistency.
    pub fn validate(&self) -> Result<(), String> {
        fn in_range<T: PartialOrd + std::fmt::Display>(
            name: &str,
            value: Option<T>,
            min: T,
            max: T,
        ) -> Result<(), String> {
            match value {
                Some(v) if v < min || v > max => {
                    Err(format!("{name} must be between {min} and {max}, got {v}"))
                }
                _ => Ok(()),
            }
        }

        in_range("font_weight", self.font_weight, 100, 900)?;
        in_range("font_size", self.font_size, 12, 200)?;
        in_range("border_width", self.border_width, 0, 10)?;
        in_range("shadow_x", self.shadow_x, -20, 20)?;
        in_range("shadow_y", self.shadow_y, -20, 20)?;
        in_range("background_opacity", self.background_opacity, 0.0, 1.0)?;
        in_range("text_opacity", self.text_opacity, 0.0, 1.0)?;
        in_range("max_text_width_percent", self.max_text_width_percent, 10, 100)?;
        in_range("line_spacing", self.line_spacing, -50, 50)?;

        if let Some(lead) = self.fade_out_before_end {
            if !(lead.is_finite() && lead > 0.0) {
                return Err(format!("fade_out_before_end must be positive, got {lead}"));
            }
        }

        for (name, color) in [
            ("text_color", &self.text_color),
            ("border_color", &self.border_color),
            ("shadow_color", &self.shadow_color),
            ("background_color", &self.background_color),
        ] {
            if let Some(c) = color {
                if !is_valid_color(c) {
                    return Err(format!(
                        "Invalid {name}: {c}. Use hex (#RRGGBB) or named colors"
                    ));
                }
            }
        }

        if self.position == Some(Position::Custom)
            && (self.custom_x.is_none() || self.custom_y.is_none())
        {
            return Err("custom position requires custom_x and custom_y".to_string());
        }

        Ok(())
    }
}
