//! Raw program file loading.
//!
//! A CHIP-8 program file is the exact byte image to place at 0x200, with
//! no header. Images larger than the space between 0x200 and the end of
//! memory are rejected rather than truncated.

use crate::cpu::memory::MAX_PROGRAM_SIZE;
use std::path::Path;
use thiserror::Error;

/// A loaded program image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rom {
    /// Display name, usually the file stem.
    pub name: String,
    /// The image bytes.
    pub bytes: Vec<u8>,
}

impl Rom {
    /// Wrap an in-memory image, checking that it fits.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, RomError> {
        if bytes.is_empty() {
            return Err(RomError::Empty);
        }
        if bytes.len() > MAX_PROGRAM_SIZE {
            return Err(RomError::TooLarge {
                size: bytes.len(),
                max: MAX_PROGRAM_SIZE,
            });
        }
        Ok(Self { name: name.into(), bytes })
    }

    /// Get the image size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Instruction words in the image, big-endian. An odd trailing byte is
    /// padded with zero.
    pub fn words(&self) -> impl Iterator<Item = u16> + '_ {
        self.bytes.chunks(2).map(|pair| {
            let hi = pair[0];
            let lo = pair.get(1).copied().unwrap_or(0);
            u16::from_be_bytes([hi, lo])
        })
    }
}

/// Load a program file from disk.
pub fn load_rom<P: AsRef<Path>>(path: P) -> Result<Rom, RomError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| RomError::IoError(e.to_string()))?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "program".to_string());

    let rom = Rom::from_bytes(name, bytes)?;
    log::debug!("read {} ({} bytes) from {}", rom.name, rom.len(), path.display());
    Ok(rom)
}

/// Errors that can occur while loading a program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RomError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("program is {size} bytes, at most {max} fit above 0x200")]
    TooLarge { size: usize, max: usize },

    #[error("program is empty")]
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bytes() {
        let rom = Rom::from_bytes("add", vec![0x6A, 0x02, 0x6B, 0x03]).unwrap();
        assert_eq!(rom.len(), 4);
        assert_eq!(rom.words().collect::<Vec<_>>(), vec![0x6A02, 0x6B03]);
    }

    #[test]
    fn test_odd_length_pads_last_word() {
        let rom = Rom::from_bytes("odd", vec![0x12, 0x00, 0xAB]).unwrap();
        assert_eq!(rom.words().collect::<Vec<_>>(), vec![0x1200, 0xAB00]);
    }

    #[test]
    fn test_size_limits() {
        assert_eq!(Rom::from_bytes("empty", vec![]), Err(RomError::Empty));
        assert!(Rom::from_bytes("max", vec![0; MAX_PROGRAM_SIZE]).is_ok());
        assert_eq!(
            Rom::from_bytes("big", vec![0; MAX_PROGRAM_SIZE + 1]),
            Err(RomError::TooLarge { size: MAX_PROGRAM_SIZE + 1, max: MAX_PROGRAM_SIZE })
        );
    }

    #[test]
    fn test_load_from_disk() {
        let path = std::env::temp_dir().join(format!("chip8-loader-{}.ch8", std::process::id()));
        std::fs::write(&path, [0x00, 0xE0, 0x12, 0x00]).unwrap();

        let rom = load_rom(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(rom.bytes, vec![0x00, 0xE0, 0x12, 0x00]);
        assert!(rom.name.starts_with("chip8-loader-"));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            load_rom("/nonexistent/definitely/missing.ch8"),
            Err(RomError::IoError(_))
        ));
    }
}
