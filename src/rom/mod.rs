//! Program images.
//!
//! This module provides:
//! - a loader for raw `.ch8` program files
//! - a disassembler (bytes → readable text)

pub mod loader;
pub mod disasm;

pub use loader::{load_rom, Rom, RomError};
pub use disasm::{disassemble, disassemble_instruction};
