//! Named color table shared by validation and filter building.

/// Named colors accepted in styles, with their `0xRRGGBB` renderer codes.
pub const NAMED_COLORS: &[(&str, &str)] = &[
    ("white", "0xFFFFFF"),
    ("black", "0x000000"),
    ("red", "0xFF0000"),
    ("green", "0x00FF00"),
    ("blue", "0x0000FF"),
    ("yellow", "0xFFFF00"),
    ("cyan", "0x00FFFF"),
    ("magenta", "0xFF00FF"),
    ("orange", "0xFFA500"),
    ("purple", "0x800080"),
    ("pink", "0xFFC0CB"),
    ("gray", "0x808080"),
    ("grey", "0x808080"),
];

/// Look up the renderer code of a named color (case-insensitive).
pub fn named_color_code(name: &str) -> Option<&'static str> {
    let lower = name.to_lowercase();
    NAMED_COLORS
        .iter()
        .find(|(n, _)| *n == lower)
        .map(|(_, code)| *code)
}

/// Whether `value` is a known color name or a six digit hex color,
/// with or without a leading `#`.
pub fn is_valid_color(value: &str) -> bool {
    if named_color_code(value).is_some() {
        return true;
    }
    let hex = value.strip_prefix('#').unwrap_or(value);
    hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit())
}
