//! Monochrome 64×32 frame buffer and sprite blitter.
//!
//! One byte per pixel, 0 or 1, row-major. Sprites are XOR-composited; a
//! sprite pixel landing on a lit pixel reports a collision.

use serde::{Serialize, Deserialize};

pub const DISPLAY_WIDTH: usize = 64;
pub const DISPLAY_HEIGHT: usize = 32;
pub const DISPLAY_SIZE: usize = DISPLAY_WIDTH * DISPLAY_HEIGHT;

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Frame")]
pub struct Display {
    pixels: Vec<u8>,
    /// Set whenever the contents change. Only the renderer clears it.
    pub draw_flag: bool,
}

/// Unchecked serialized form of [`Display`].
#[derive(Deserialize)]
struct Frame {
    pixels: Vec<u8>,
    draw_flag: bool,
}

impl TryFrom<Frame> for Display {
    type Error = String;

    fn try_from(frame: Frame) -> Result<Self, Self::Error> {
        if frame.pixels.len() != DISPLAY_SIZE {
            return Err(format!(
                "frame has {} pixels, expected {}",
                frame.pixels.len(),
                DISPLAY_SIZE
            ));
        }
        if let Some(p) = frame.pixels.iter().find(|&&p| p > 1) {
            return Err(format!("pixel value {} is not 0 or 1", p));
        }
        Ok(Self { pixels: frame.pixels, draw_flag: frame.draw_flag })
    }
}

impl Display {
    /// Create a blank display.
    pub fn new() -> Self {
        Self {
            pixels: vec![0; DISPLAY_SIZE],
            draw_flag: false,
        }
    }

    /// Turn every pixel off.
    pub fn clear(&mut self) {
        self.pixels.fill(0);
        self.draw_flag = true;
    }

    /// Reset to power-on state: blank and no pending frame.
    pub fn reset(&mut self) {
        self.pixels.fill(0);
        self.draw_flag = false;
    }

    /// XOR a sprite onto the buffer with its top-left corner at (`x`, `y`).
    ///
    /// Each row is eight pixels wide, most significant bit leftmost.
    /// Wraparound is applied to the final linear pixel address, so a sprite
    /// running off the right edge re-enters on the following row and one
    /// running off the bottom re-enters at the top of the buffer.
    ///
    /// Returns true if any sprite pixel hit a pixel that was already lit.
    pub fn draw_sprite(&mut self, x: u8, y: u8, rows: &[u8]) -> bool {
        let mut collision = false;

        for (r, &row) in rows.iter().enumerate() {
            for b in 0..8 {
                if row & (0x80 >> b) == 0 {
                    continue;
                }
                let addr = ((y as usize + r) * DISPLAY_WIDTH + x as usize + b) % DISPLAY_SIZE;
                if self.pixels[addr] == 1 {
                    collision = true;
                }
                self.pixels[addr] ^= 1;
            }
        }

        self.draw_flag = true;
        collision
    }

    /// Pixel state at (`x`, `y`); coordinates outside the display read as off.
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        x < DISPLAY_WIDTH && y < DISPLAY_HEIGHT && self.pixels[y * DISPLAY_WIDTH + x] == 1
    }

    /// Consume the pending-frame flag.
    pub fn take_draw_flag(&mut self) -> bool {
        std::mem::take(&mut self.draw_flag)
    }

    /// Iterate over rows of pixels, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.pixels.chunks(DISPLAY_WIDTH)
    }

    /// Raw row-major pixel buffer.
    pub fn as_slice(&self) -> &[u8] {
        &self.pixels
    }

    /// Number of lit pixels.
    pub fn lit_count(&self) -> usize {
        self.pixels.iter().filter(|&&p| p == 1).count()
    }

    /// Render as text, `#` for lit and `.` for dark, one line per row.
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity(DISPLAY_SIZE + DISPLAY_HEIGHT);
        for row in self.rows() {
            out.extend(row.iter().map(|&p| if p == 1 { '#' } else { '.' }));
            out.push('\n');
        }
        out
    }
}

impl Default for Display {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Display {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Display")
            .field("lit_pixels", &self.lit_count())
            .field("draw_flag", &self.draw_flag)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_is_validated_on_load() {
        let mut display = Display::new();
        display.draw_sprite(3, 4, &[0xFF]);
        let json = serde_json::to_value(&display).unwrap();
        let restored: Display = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(restored, display);

        let mut short = json.clone();
        short["pixels"] = serde_json::json!([0, 1]);
        assert!(serde_json::from_value::<Display>(short).is_err());

        let mut bad_pixel = json;
        bad_pixel["pixels"][0] = serde_json::json!(2);
        assert!(serde_json::from_value::<Display>(bad_pixel).is_err());
    }

    #[test]
    fn test_draw_single_row() {
        let mut display = Display::new();
        let collision = display.draw_sprite(0, 0, &[0b1010_0000]);

        assert!(!collision);
        assert!(display.pixel(0, 0));
        assert!(!display.pixel(1, 0));
        assert!(display.pixel(2, 0));
        assert!(display.draw_flag);
    }

    #[test]
    fn test_draw_twice_erases_and_collides() {
        let mut display = Display::new();
        let glyph = [0xF0, 0x90, 0x90, 0x90, 0xF0];

        assert!(!display.draw_sprite(10, 5, &glyph));
        assert_eq!(display.lit_count(), 14);

        assert!(display.draw_sprite(10, 5, &glyph));
        assert_eq!(display.lit_count(), 0);
    }

    #[test]
    fn test_wraps_right_edge_onto_next_row() {
        let mut display = Display::new();
        display.draw_sprite(62, 0, &[0xF0]);

        assert!(display.pixel(62, 0));
        assert!(display.pixel(63, 0));
        assert!(display.pixel(0, 1));
        assert!(display.pixel(1, 1));
        assert!(!display.pixel(0, 0));
    }

    #[test]
    fn test_wraps_bottom_onto_top() {
        let mut display = Display::new();
        display.draw_sprite(0, 31, &[0x80, 0x80]);

        assert!(display.pixel(0, 31));
        assert!(display.pixel(0, 0));
    }

    #[test]
    fn test_large_coordinates_wrap_linearly() {
        let mut display = Display::new();
        // (255 * 64 + 255) % 2048 = 1983 -> row 30, column 63
        display.draw_sprite(255, 255, &[0x80]);
        assert!(display.pixel(63, 30));
    }

    #[test]
    fn test_collision_only_on_overlap() {
        let mut display = Display::new();
        display.draw_sprite(0, 0, &[0x80]);
        assert!(!display.draw_sprite(1, 0, &[0x80]));
        assert!(display.draw_sprite(0, 0, &[0xE0]));
        assert!(!display.pixel(0, 0));
        assert!(!display.pixel(1, 0));
        assert!(display.pixel(2, 0));
    }

    #[test]
    fn test_empty_sprite_sets_draw_flag() {
        let mut display = Display::new();
        assert!(!display.draw_sprite(0, 0, &[0x00]));
        assert!(display.take_draw_flag());
        assert!(!display.draw_flag);
    }

    #[test]
    fn test_clear() {
        let mut display = Display::new();
        display.draw_sprite(0, 0, &[0xFF]);
        display.take_draw_flag();

        display.clear();
        assert_eq!(display.lit_count(), 0);
        assert!(display.draw_flag);
    }

    #[test]
    fn test_ascii() {
        let mut display = Display::new();
        display.draw_sprite(0, 0, &[0xC0]);
        let text = display.to_ascii();
        assert!(text.starts_with("##.."));
        assert_eq!(text.lines().count(), DISPLAY_HEIGHT);
    }
}
