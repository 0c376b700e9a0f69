//! # CHIP-8 Emulator
//!
//! An interpreter for the CHIP-8 virtual machine of the late 1970s.
//!
//! The core is [`Cpu`]: a single owned value holding memory, registers,
//! stack, timers, display and keypad. [`Cpu::step`] runs exactly one
//! instruction and [`Cpu::tick`] decrements the timers once; how often each
//! is called is up to the host (see [`clock::Pacer`]).

pub mod cpu;
pub mod clock;
pub mod config;
pub mod rom;

#[cfg(feature = "tui")]
pub mod tui;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use cpu::{Cpu, CpuError, StepOutcome, Instruction, Quirks, ShiftSource, Memory, Registers};
pub use clock::{Pacer, Budget};
pub use config::{Config, ConfigError};
pub use rom::{disassemble, load_rom, Rom, RomError};

#[cfg(feature = "tui")]
pub use tui::run_debugger;
