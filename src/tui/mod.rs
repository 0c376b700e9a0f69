//! Terminal frontend for the CHIP-8 machine.
//!
//! Provides an interactive terminal-based debugger with:
//! - the 64×32 screen drawn with half-block characters
//! - hex keypad input from the keyboard
//! - wall-clock paced execution with step/run/breakpoint controls
//! - register, stack, memory and disassembly views

mod app;
mod ui;

pub use app::{DebuggerApp, keymap, run_debugger};
pub use ui::screen_lines;
