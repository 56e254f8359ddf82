//! Colour parsing

use image::Rgb;

use crate::error::{MontageError, MontageResult};

const NAMED_COLORS: &[(&str, [u8; 3])] = &[
    ("black", [0x00, 0x00, 0x00]),
    ("white", [0xFF, 0xFF, 0xFF]),
    ("red", [0xFF, 0x00, 0x00]),
    ("lime", [0x00, 0xFF, 0x00]),
    ("green", [0x00, 0x80, 0x00]),
    ("blue", [0x00, 0x00, 0xFF]),
    ("yellow", [0xFF, 0xFF, 0x00]),
    ("cyan", [0x00, 0xFF, 0xFF]),
    ("magenta", [0xFF, 0x00, 0xFF]),
    ("silver", [0xC0, 0xC0, 0xC0]),
    ("gray", [0x80, 0x80, 0x80]),
    ("grey", [0x80, 0x80, 0x80]),
    ("maroon", [0x80, 0x00, 0x00]),
    ("olive", [0x80, 0x80, 0x00]),
    ("purple", [0x80, 0x00, 0x80]),
    ("teal", [0x00, 0x80, 0x80]),
    ("navy", [0x00, 0x00, 0x80]),
    ("darkgray", [0xA9, 0xA9, 0xA9]),
    ("darkgrey", [0xA9, 0xA9, 0xA9]),
    ("lightgray", [0xD3, 0xD3, 0xD3]),
    ("lightgrey", [0xD3, 0xD3, 0xD3]),
];

/// Parse `#RRGGBB`, `RRGGBB` or a colour name (case-insensitive)
pub fn parse_color(value: &str) -> MontageResult<Rgb<u8>> {
    let trimmed = value.trim();
    let lower = trimmed.to_ascii_lowercase();

    if let Some((_, rgb)) = NAMED_COLORS.iter().find(|(name, _)| *name == lower) {
        return Ok(Rgb(*rgb));
    }

    let hex = lower.strip_prefix('#').unwrap_or(&lower);
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(MontageError::config(format!(
            "Invalid color format: {value:?}. Expected #RRGGBB, RRGGBB or a color name"
        )));
    }

    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&hex[range], 16)
            .map_err(|e| MontageError::config(format!("Invalid color {value:?}: {e}")))
    };

    Ok(Rgb([channel(0..2)?, channel(2..4)?, channel(4..6)?]))
}
