//! CHIP-8 virtual machine.
//!
//! This module implements the complete machine model:
//! - 4KB byte-addressable memory with the glyph table at 0x050
//! - 16 8-bit registers V0-VF, 16-bit index I, 16-bit PC
//! - 16-entry return stack, delay and sound timers
//! - 64×32 monochrome display and a 16-key hex keypad
//! - the 34-instruction set, one instruction per step

pub mod font;
pub mod memory;
pub mod registers;
pub mod timers;
pub mod display;
pub mod keypad;
pub mod quirks;
pub mod decode;
pub mod execute;

pub use memory::{Memory, MemoryError};
pub use registers::{Registers, Stack, StackError};
pub use timers::Timers;
pub use display::Display;
pub use keypad::Keypad;
pub use quirks::{Quirks, ShiftSource};
pub use decode::{Instruction, DecodeError};
pub use execute::{Cpu, CpuError, StepOutcome};
