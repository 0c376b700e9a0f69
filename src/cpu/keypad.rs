//! 16-key hexadecimal keypad state.
//!
//! The CPU only reads this; hosts write it from whatever physical input
//! they have.

use serde::{Serialize, Deserialize};

/// Number of keys, 0x0 through 0xF.
pub const KEY_COUNT: usize = 16;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keypad {
    keys: [bool; KEY_COUNT],
}

impl Keypad {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a key's state. Only the low nibble of `key` is used.
    pub fn set(&mut self, key: u8, pressed: bool) {
        self.keys[(key & 0x0F) as usize] = pressed;
    }

    pub fn press(&mut self, key: u8) {
        self.set(key, true);
    }

    pub fn release(&mut self, key: u8) {
        self.set(key, false);
    }

    pub fn release_all(&mut self) {
        self.keys = [false; KEY_COUNT];
    }

    /// Whether a key is held. Only the low nibble of `key` is used.
    pub fn is_pressed(&self, key: u8) -> bool {
        self.keys[(key & 0x0F) as usize]
    }

    /// Lowest-numbered key currently held, if any.
    pub fn first_pressed(&self) -> Option<u8> {
        self.keys.iter().position(|&k| k).map(|k| k as u8)
    }

    pub fn as_array(&self) -> &[bool; KEY_COUNT] {
        &self.keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_release() {
        let mut keypad = Keypad::new();
        keypad.press(0xA);
        assert!(keypad.is_pressed(0xA));
        keypad.release(0xA);
        assert!(!keypad.is_pressed(0xA));
    }

    #[test]
    fn test_first_pressed_scans_in_order() {
        let mut keypad = Keypad::new();
        assert_eq!(keypad.first_pressed(), None);

        keypad.press(0xC);
        keypad.press(0x3);
        assert_eq!(keypad.first_pressed(), Some(0x3));
    }

    #[test]
    fn test_key_index_is_masked() {
        let mut keypad = Keypad::new();
        keypad.press(0x15);
        assert!(keypad.is_pressed(0x5));
        assert!(keypad.is_pressed(0xF5));
    }
}
