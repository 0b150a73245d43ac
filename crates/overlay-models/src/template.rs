//! Named style templates.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::fonts::FontCatalog;
use crate::style::{Position, StyleDescriptor};

/// Template used when a request does not name one.
pub const DEFAULT_TEMPLATE_NAME: &str = "default";

/// A named, reusable base style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StyleTemplate {
    pub name: String,
    pub style: StyleDescriptor,
    #[serde(default)]
    pub is_default: bool,
}

impl StyleTemplate {
    pub fn new(name: impl Into<String>, style: StyleDescriptor) -> Self {
        Self {
            name: name.into(),
            style,
            is_default: false,
        }
    }

    /// The built-in `default` template: white semibold text with a black
    /// outline and drop shadow, centered, wrapped at 80% of the frame.
    pub fn builtin_default(fonts: &FontCatalog) -> Self {
        Self {
            name: DEFAULT_TEMPLATE_NAME.to_string(),
            style: StyleDescriptor {
                font_path: fonts.semibold.clone(),
                font_size: 64,
                font_weight: 600,
                text_color: "white".to_string(),
                border_width: 3,
                border_color: "black".to_string(),
                shadow_x: 2,
                shadow_y: 2,
                shadow_color: "black".to_string(),
                background_enabled: false,
                background_color: "black".to_string(),
                background_opacity: 0.5,
                text_opacity: 1.0,
                position: Position::Center,
                custom_x: None,
                custom_y: None,
                alignment: None,
                max_text_width_percent: Some(80),
                line_spacing: -8,
                fade_out_before_end: None,
            },
            is_default: true,
        }
    }
}
