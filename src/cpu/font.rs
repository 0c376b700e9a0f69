//! Built-in hexadecimal glyphs.
//!
//! Sixteen 4×5 sprites for the digits 0-F, five bytes each. Only the high
//! nibble of every byte is lit.

/// Address of the first glyph byte.
pub const FONT_START: usize = 0x050;

/// Bytes per glyph.
pub const GLYPH_SIZE: usize = 5;

/// The complete glyph table, 0 through F.
pub const FONT: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// Address of the glyph for a hex digit.
///
/// Digits above 0xF are not masked; the result simply points past the table.
pub fn glyph_address(digit: u8) -> u16 {
    digit as u16 * GLYPH_SIZE as u16 + FONT_START as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_table_size() {
        assert_eq!(FONT.len(), 16 * GLYPH_SIZE);
    }

    #[test]
    fn test_glyph_address() {
        assert_eq!(glyph_address(0), 0x050);
        assert_eq!(glyph_address(0xA), 0x050 + 50);
        assert_eq!(glyph_address(0xF), 0x09B);
    }

    #[test]
    fn test_glyphs_use_high_nibble_only() {
        assert!(FONT.iter().all(|b| b & 0x0F == 0));
    }
}
