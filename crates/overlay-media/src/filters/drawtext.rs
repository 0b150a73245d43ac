//! Text overlay (`drawtext`) directive.
//!
//! The text itself never appears inside the filter string. It is written to
//! a side-channel file referenced by `textfile=` and rendered with
//! `expansion=none`, so quotes, colons, percent signs and backslashes in
//! user text need no escaping.

use std::path::Path;

use overlay_models::color::named_color_code;
use overlay_models::{MediaMetadata, Position, StyleDescriptor};

use super::escape_filter_path;

/// Distance from the frame edge for edge-anchored positions, in pixels.
pub const ANCHOR_MARGIN: u32 = 10;

/// Opacity applied to the shadow color.
pub const SHADOW_OPACITY: f32 = 0.7;

/// Padding around the text when the background box is enabled.
pub const BOX_BORDER: u32 = 5;

const FALLBACK_COLOR: &str = "0xFFFFFF";

/// Convert a style color to the renderer's `0xRRGGBB` form.
///
/// Named colors come from the shared table, hex colors may carry a leading
/// `#`. Anything unrecognized renders white.
pub fn to_ffmpeg_color(color: &str) -> String {
    if let Some(code) = named_color_code(color) {
        return code.to_string();
    }

    let hex = color.strip_prefix('#').unwrap_or(color);
    if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return format!("0x{}", hex.to_uppercase());
    }

    FALLBACK_COLOR.to_string()
}

/// `x`/`y` expressions for a position.
///
/// `Custom` uses the literal coordinates; if either is missing it falls back
/// to the center anchor.
pub fn anchor_expressions(
    position: Position,
    custom: Option<(u32, u32)>,
) -> (String, String) {
    let m = ANCHOR_MARGIN;
    let center_x = "(w-text_w)/2".to_string();
    let center_y = "(h-text_h)/2".to_string();
    let right = format!("w-text_w-{m}");
    let bottom = format!("h-text_h-{m}");

    match position {
        Position::Center => (center_x, center_y),
        Position::TopLeft => (m.to_string(), m.to_string()),
        Position::TopRight => (right, m.to_string()),
        Position::TopCenter => (center_x, m.to_string()),
        Position::BottomLeft => (m.to_string(), bottom),
        Position::BottomRight => (right, bottom),
        Position::BottomCenter => (center_x, bottom),
        Position::MiddleLeft => (m.to_string(), center_y),
        Position::MiddleRight => (right, center_y),
        Position::Custom => match custom {
            Some((x, y)) => (x.to_string(), y.to_string()),
            None => (center_x, center_y),
        },
    }
}

/// Hard-cut visibility step: fully visible until `duration - lead`, then
/// invisible. Returns `None` when the cut would land at or before zero.
pub fn fade_alpha_expr(duration: f64, lead: f64) -> Option<String> {
    let cut = duration - lead;
    if !(cut.is_finite() && cut > 0.0) {
        return None;
    }
    Some(format!("'if(lt(t,{cut:.3}),1,0)'"))
}

/// Build the `drawtext` directive for one input.
///
/// `font_size` is the already scaled size from layout. The fade step is only
/// emitted when the style requests it and the media duration is known.
pub fn build_drawtext_filter(
    style: &StyleDescriptor,
    font_size: u32,
    text_file: &Path,
    media: &MediaMetadata,
) -> String {
    let (x, y) = anchor_expressions(style.position, style.custom_coordinates());

    let mut params = vec![
        format!(
            "fontfile='{}'",
            escape_filter_path(&style.font_path.to_string_lossy())
        ),
        format!(
            "textfile='{}'",
            escape_filter_path(&text_file.to_string_lossy())
        ),
        "expansion=none".to_string(),
        format!("fontsize={font_size}"),
        format!(
            "fontcolor={}@{}",
            to_ffmpeg_color(&style.text_color),
            style.text_opacity
        ),
        format!("x={x}"),
        format!("y={y}"),
    ];

    if style.border_width > 0 {
        params.push(format!("borderw={}", style.border_width));
        params.push(format!("bordercolor={}", to_ffmpeg_color(&style.border_color)));
    }

    if style.shadow_x != 0 || style.shadow_y != 0 {
        params.push(format!("shadowx={}", style.shadow_x));
        params.push(format!("shadowy={}", style.shadow_y));
        params.push(format!(
            "shadowcolor={}@{}",
            to_ffmpeg_color(&style.shadow_color),
            SHADOW_OPACITY
        ));
    }

    if style.background_enabled {
        params.push("box=1".to_string());
        params.push(format!(
            "boxcolor={}@{}",
            to_ffmpeg_color(&style.background_color),
            style.background_opacity
        ));
        params.push(format!("boxborderw={BOX_BORDER}"));
    }

    // Older ffmpeg builds reject text_align, so only emit it on request
    if let Some(alignment) = style.alignment {
        params.push(format!("text_align={alignment}"));
    }
    params.push(format!("line_spacing={}", style.line_spacing));

    if let (Some(lead), Some(duration)) = (style.fade_out_before_end, media.duration) {
        if let Some(alpha) = fade_alpha_expr(duration, lead) {
            params.push(format!("alpha={alpha}"));
        }
    }

    format!("drawtext={}", params.join(":"))
}
