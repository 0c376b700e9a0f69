//! CHIP-8 memory subsystem.
//!
//! 4KB of byte-addressable RAM. The interpreter area below 0x200 holds the
//! glyph table at 0x050; programs are loaded at 0x200 and run to the end
//! of memory.

use crate::cpu::font::{FONT, FONT_START};
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// The number of addressable bytes.
pub const MEMORY_SIZE: usize = 4096;

/// Where programs are loaded and where execution starts.
pub const PROGRAM_START: usize = 0x200;

/// Largest program that fits between `PROGRAM_START` and the end of memory.
pub const MAX_PROGRAM_SIZE: usize = MEMORY_SIZE - PROGRAM_START;

/// CHIP-8 memory: 4096 bytes.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MemoryImage")]
pub struct Memory {
    bytes: Vec<u8>,
}

/// Unchecked serialized form of [`Memory`].
#[derive(Deserialize)]
struct MemoryImage {
    bytes: Vec<u8>,
}

impl TryFrom<MemoryImage> for Memory {
    type Error = String;

    fn try_from(image: MemoryImage) -> Result<Self, Self::Error> {
        if image.bytes.len() != MEMORY_SIZE {
            return Err(format!(
                "memory image is {} bytes, expected {}",
                image.bytes.len(),
                MEMORY_SIZE
            ));
        }
        Ok(Self { bytes: image.bytes })
    }
}

impl Memory {
    /// Create a new memory with all bytes zeroed.
    pub fn new() -> Self {
        Self {
            bytes: vec![0; MEMORY_SIZE],
        }
    }

    /// Read one byte.
    #[inline]
    pub fn read(&self, addr: usize) -> Result<u8, MemoryError> {
        self.bytes
            .get(addr)
            .copied()
            .ok_or(MemoryError::OutOfBounds { addr, len: 1 })
    }

    /// Write one byte.
    #[inline]
    pub fn write(&mut self, addr: usize, value: u8) -> Result<(), MemoryError> {
        let cell = self.bytes
            .get_mut(addr)
            .ok_or(MemoryError::OutOfBounds { addr, len: 1 })?;
        *cell = value;
        Ok(())
    }

    /// Read a big-endian 16-bit word at `addr` and `addr + 1`.
    pub fn read_word(&self, addr: usize) -> Result<u16, MemoryError> {
        let pair = self.read_range(addr, 2)?;
        Ok(u16::from_be_bytes([pair[0], pair[1]]))
    }

    /// Borrow `len` consecutive bytes starting at `addr`.
    ///
    /// Fails unless the whole range lies inside memory.
    pub fn read_range(&self, addr: usize, len: usize) -> Result<&[u8], MemoryError> {
        let end = Self::checked_end(addr, len)?;
        Ok(&self.bytes[addr..end])
    }

    /// Copy `data` into memory starting at `addr`.
    ///
    /// Nothing is written unless the whole range fits.
    pub fn write_range(&mut self, addr: usize, data: &[u8]) -> Result<(), MemoryError> {
        let end = Self::checked_end(addr, data.len())?;
        self.bytes[addr..end].copy_from_slice(data);
        Ok(())
    }

    fn checked_end(addr: usize, len: usize) -> Result<usize, MemoryError> {
        match addr.checked_add(len) {
            Some(end) if end <= MEMORY_SIZE => Ok(end),
            _ => Err(MemoryError::OutOfBounds { addr, len }),
        }
    }

    /// Clear all memory to zeros.
    pub fn clear(&mut self) {
        self.bytes.fill(0);
    }

    /// Copy the built-in glyph table into the interpreter area.
    pub fn load_font(&mut self) {
        self.bytes[FONT_START..FONT_START + FONT.len()].copy_from_slice(&FONT);
    }

    /// Load a program into memory starting at the given address.
    pub fn load_program(&mut self, start_addr: usize, program: &[u8]) -> Result<(), MemoryError> {
        let available = MEMORY_SIZE.saturating_sub(start_addr);
        if program.len() > available {
            return Err(MemoryError::ProgramTooLarge {
                size: program.len(),
                available,
            });
        }

        self.bytes[start_addr..start_addr + program.len()].copy_from_slice(program);
        Ok(())
    }

    /// Dump memory contents (for debugging).
    pub fn dump(&self, start: usize, count: usize) -> Vec<(usize, u8)> {
        let end = start.saturating_add(count).min(MEMORY_SIZE);
        (start.min(end)..end)
            .map(|i| (i, self.bytes[i]))
            .collect()
    }

    /// The whole memory image.
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let non_zero = self.bytes.iter().filter(|b| **b != 0).count();

        f.debug_struct("Memory")
            .field("non_zero_bytes", &non_zero)
            .field("total_bytes", &MEMORY_SIZE)
            .finish()
    }
}

/// Errors that can occur during memory operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    /// Some byte of the `len`-byte access at `addr` falls outside memory.
    #[error("access of {len} byte(s) at {addr:#05X} is outside memory (0x000-0xFFF)")]
    OutOfBounds { addr: usize, len: usize },

    /// Program is too large to fit in memory.
    #[error("program size {size} exceeds available space {available}")]
    ProgramTooLarge { size: usize, available: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_must_be_full_size() {
        let json = serde_json::to_string(&Memory::new()).unwrap();
        let restored: Memory = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, Memory::new());

        let short = serde_json::from_str::<Memory>(r#"{"bytes":[18,0]}"#);
        assert!(short.unwrap_err().to_string().contains("expected 4096"));
    }

    #[test]
    fn test_memory_read_write() {
        let mut mem = Memory::new();
        mem.write(0x300, 42).unwrap();
        assert_eq!(mem.read(0x300).unwrap(), 42);
    }

    #[test]
    fn test_memory_bounds() {
        let mut mem = Memory::new();

        assert!(mem.read(0).is_ok());
        assert!(mem.read(0xFFF).is_ok());
        assert_eq!(
            mem.read(0x1000),
            Err(MemoryError::OutOfBounds { addr: 0x1000, len: 1 })
        );
        assert!(mem.write(0x1000, 1).is_err());
    }

    #[test]
    fn test_read_word_is_big_endian() {
        let mut mem = Memory::new();
        mem.write_range(0x200, &[0x6A, 0x02]).unwrap();
        assert_eq!(mem.read_word(0x200).unwrap(), 0x6A02);
    }

    #[test]
    fn test_read_word_straddling_end_fails() {
        let mem = Memory::new();
        assert!(mem.read_word(0xFFE).is_ok());
        assert_eq!(
            mem.read_word(0xFFF),
            Err(MemoryError::OutOfBounds { addr: 0xFFF, len: 2 })
        );
    }

    #[test]
    fn test_write_range_is_all_or_nothing() {
        let mut mem = Memory::new();
        assert!(mem.write_range(0xFFE, &[1, 2, 3]).is_err());
        assert_eq!(mem.read(0xFFE).unwrap(), 0);
        assert_eq!(mem.read(0xFFF).unwrap(), 0);
    }

    #[test]
    fn test_load_font() {
        let mut mem = Memory::new();
        mem.load_font();
        assert_eq!(mem.read_range(FONT_START, FONT.len()).unwrap(), &FONT[..]);
    }

    #[test]
    fn test_load_program() {
        let mut mem = Memory::new();
        mem.load_program(PROGRAM_START, &[1, 2, 3]).unwrap();

        assert_eq!(mem.read(0x200).unwrap(), 1);
        assert_eq!(mem.read(0x201).unwrap(), 2);
        assert_eq!(mem.read(0x202).unwrap(), 3);
    }

    #[test]
    fn test_load_program_too_large() {
        let mut mem = Memory::new();
        let program = vec![0xAA; MAX_PROGRAM_SIZE + 1];

        assert_eq!(
            mem.load_program(PROGRAM_START, &program),
            Err(MemoryError::ProgramTooLarge { size: MAX_PROGRAM_SIZE + 1, available: MAX_PROGRAM_SIZE })
        );
        assert_eq!(mem.read(PROGRAM_START).unwrap(), 0);

        let exact = vec![0xAA; MAX_PROGRAM_SIZE];
        assert!(mem.load_program(PROGRAM_START, &exact).is_ok());
        assert_eq!(mem.read(0xFFF).unwrap(), 0xAA);
    }

    #[test]
    fn test_dump_clamps_to_memory() {
        let mem = Memory::new();
        assert_eq!(mem.dump(0xFFE, 10).len(), 2);
        assert!(mem.dump(0x2000, 4).is_empty());
    }
}
