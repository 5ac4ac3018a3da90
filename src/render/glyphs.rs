//! Built-in 5×7 bitmap font
//!
//! Covers printable ASCII from space to underscore. Lowercase letters use the
//! uppercase shapes; anything else draws as a hollow box.

use super::surface::{Rgba, Surface};

pub const GLYPH_WIDTH: u32 = 5;
pub const GLYPH_HEIGHT: u32 = 7;

/// Horizontal gap between glyphs, in glyph pixels
const GLYPH_SPACING: u32 = 1;

/// Rows top to bottom; bit 4 is the leftmost column
const FONT_5X7: [[u8; 7]; 64] = [
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00], // ' '
    [0x04, 0x04, 0x04, 0x04, 0x00, 0x04, 0x00], // '!'
    [0x0A, 0x0A, 0x00, 0x00, 0x00, 0x00, 0x00], // '"'
    [0x0A, 0x1F, 0x0A, 0x1F, 0x0A, 0x00, 0x00], // '#'
    [0x04, 0x0E, 0x14, 0x0E, 0x05, 0x0E, 0x04], // '$'
    [0x19, 0x1A, 0x04, 0x0B, 0x13, 0x00, 0x00], // '%'
    [0x0C, 0x12, 0x0C, 0x12, 0x13, 0x0D, 0x00], // '&'
    [0x04, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00], // "'"
    [0x04, 0x08, 0x08, 0x08, 0x08, 0x04, 0x00], // '('
    [0x04, 0x02, 0x02, 0x02, 0x02, 0x04, 0x00], // ')'
    [0x00, 0x15, 0x0E, 0x15, 0x00, 0x00, 0x00], // '*'
    [0x00, 0x04, 0x04, 0x1F, 0x04, 0x04, 0x00], // '+'
    [0x00, 0x00, 0x00, 0x00, 0x04, 0x04, 0x08], // ','
    [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00], // '-'
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x04, 0x00], // '.'
    [0x01, 0x02, 0x04, 0x08, 0x10, 0x00, 0x00], // '/'
    [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E], // '0'
    [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E], // '1'
    [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F], // '2'
    [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E], // '3'
    [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02], // '4'
    [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E], // '5'
    [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E], // '6'
    [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08], // '7'
    [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E], // '8'
    [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C], // '9'
    [0x00, 0x04, 0x00, 0x00, 0x04, 0x00, 0x00], // ':'
    [0x00, 0x04, 0x00, 0x00, 0x04, 0x04, 0x08], // ';'
    [0x02, 0x04, 0x08, 0x10, 0x08, 0x04, 0x02], // '<'
    [0x00, 0x00, 0x1F, 0x00, 0x1F, 0x00, 0x00], // '='
    [0x08, 0x04, 0x02, 0x01, 0x02, 0x04, 0x08], // '>'
    [0x0E, 0x11, 0x01, 0x02, 0x04, 0x00, 0x04], // '?'
    [0x0E, 0x11, 0x17, 0x15, 0x17, 0x10, 0x0E], // '@'
    [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11], // 'A'
    [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E], // 'B'
    [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E], // 'C'
    [0x1E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1E], // 'D'
    [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F], // 'E'
    [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10], // 'F'
    [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F], // 'G'
    [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11], // 'H'
    [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E], // 'I'
    [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C], // 'J'
    [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11], // 'K'
    [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F], // 'L'
    [0x11, 0x1B, 0x15, 0x11, 0x11, 0x11, 0x11], // 'M'
    [0x11, 0x19, 0x15, 0x13, 0x11, 0x11, 0x11], // 'N'
    [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E], // 'O'
    [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10], // 'P'
    [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D], // 'Q'
    [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11], // 'R'
    [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E], // 'S'
    [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04], // 'T'
    [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E], // 'U'
    [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04], // 'V'
    [0x11, 0x11, 0x11, 0x15, 0x15, 0x1B, 0x11], // 'W'
    [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11], // 'X'
    [0x11, 0x11, 0x0A, 0x04, 0x04, 0x04, 0x04], // 'Y'
    [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F], // 'Z'
    [0x0E, 0x08, 0x08, 0x08, 0x08, 0x08, 0x0E], // '['
    [0x10, 0x08, 0x04, 0x02, 0x01, 0x00, 0x00], // '\\'
    [0x0E, 0x02, 0x02, 0x02, 0x02, 0x02, 0x0E], // ']'
    [0x04, 0x0A, 0x11, 0x00, 0x00, 0x00, 0x00], // '^'
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x1F], // '_'
];

/// Drawn for characters outside the font
const MISSING_GLYPH: [u8; 7] = [0x1F, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1F];

/// Row bitmap for a character
pub fn glyph(c: char) -> &'static [u8; 7] {
    let c = c.to_ascii_uppercase();
    let code = c as u32;
    if (32..96).contains(&code) {
        &FONT_5X7[(code - 32) as usize]
    } else {
        &MISSING_GLYPH
    }
}

/// Whether the font has a real shape for `c`
pub fn has_glyph(c: char) -> bool {
    let code = c.to_ascii_uppercase() as u32;
    (32..96).contains(&code)
}

/// Horizontal anchor for [`draw_text`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// Width in pixels of `text` at `pixel_size` screen pixels per glyph pixel
pub fn text_width(text: &str, pixel_size: f32) -> f32 {
    let count = text.chars().count() as u32;
    if count == 0 {
        return 0.0;
    }
    let columns = count * (GLYPH_WIDTH + GLYPH_SPACING) - GLYPH_SPACING;
    columns as f32 * pixel_size
}

/// Draw a single line of text with its baseline at `baseline_y`
pub fn draw_text(
    surface: &mut Surface,
    text: &str,
    x: f32,
    baseline_y: f32,
    pixel_size: f32,
    align: TextAlign,
    color: Rgba,
) {
    let width = text_width(text, pixel_size);
    let left = match align {
        TextAlign::Left => x,
        TextAlign::Center => x - width / 2.0,
        TextAlign::Right => x - width,
    };
    let top = baseline_y - GLYPH_HEIGHT as f32 * pixel_size;
    let advance = (GLYPH_WIDTH + GLYPH_SPACING) as f32 * pixel_size;

    for (i, c) in text.chars().enumerate() {
        let origin_x = left + i as f32 * advance;
        for (row, bits) in glyph(c).iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if bits & (0x10 >> col) != 0 {
                    surface.fill_rect(
                        origin_x + col as f32 * pixel_size,
                        top + row as f32 * pixel_size,
                        pixel_size,
                        pixel_size,
                        color,
                    );
                }
            }
        }
    }
}
