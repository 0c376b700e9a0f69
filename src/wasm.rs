//! WebAssembly bindings for the CHIP-8 machine.
//!
//! This module provides JavaScript-friendly wrappers around the core emulator.
//! The page owns the animation loop: call `tick` at 60 Hz and `run_frame`
//! with however many steps it wants per frame.

use wasm_bindgen::prelude::*;
use crate::cpu::{Cpu, CpuError, Quirks, StepOutcome};
use crate::rom::{disassemble_instruction, Rom};
use serde::Serialize;

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn js_error(e: impl std::fmt::Display) -> JsError {
    JsError::new(&e.to_string())
}

/// WebAssembly-friendly machine wrapper.
#[wasm_bindgen]
pub struct WasmChip8 {
    cpu: Cpu,
    program: Vec<u8>,
    halted: Option<CpuError>,
}

#[wasm_bindgen]
impl WasmChip8 {
    /// Create a new machine. A seed makes `CXNN` reproducible.
    #[wasm_bindgen(constructor)]
    pub fn new(seed: Option<u64>) -> Self {
        let cpu = match seed {
            Some(seed) => Cpu::with_seed(seed),
            None => Cpu::new(),
        };
        Self {
            cpu,
            program: Vec::new(),
            halted: None,
        }
    }

    /// Load a program image and reset the machine.
    #[wasm_bindgen]
    pub fn load_rom(&mut self, bytes: &[u8]) -> Result<usize, JsError> {
        let rom = Rom::from_bytes("web", bytes.to_vec()).map_err(js_error)?;
        self.program = rom.bytes;
        self.reset()?;
        Ok(self.program.len())
    }

    /// Select the shift convention: "vy" (default) or "vx".
    #[wasm_bindgen]
    pub fn set_shift_quirk(&mut self, source: &str) -> Result<(), JsError> {
        let shift_source = source.parse().map_err(|e: String| JsError::new(&e))?;
        self.cpu.quirks = Quirks { shift_source };
        Ok(())
    }

    /// Step one instruction. Returns the disassembled instruction.
    #[wasm_bindgen]
    pub fn step(&mut self) -> Result<String, JsError> {
        if let Some(e) = &self.halted {
            return Err(js_error(e));
        }

        let pc = self.cpu.regs.pc;
        match self.cpu.step() {
            Ok(StepOutcome::Executed(_)) | Ok(StepOutcome::WaitingForKey) => {
                let word = self.cpu.mem.read_word(pc as usize).unwrap_or(0);
                Ok(disassemble_instruction(word))
            }
            Ok(StepOutcome::Unknown(word)) => Ok(format!("???? ; {:04X}", word)),
            Err(e) => {
                let err = js_error(&e);
                self.halted = Some(e);
                Err(err)
            }
        }
    }

    /// Run up to `steps` instructions. Returns how many ran before a fault.
    #[wasm_bindgen]
    pub fn run_frame(&mut self, steps: u32) -> u32 {
        if self.halted.is_some() {
            return 0;
        }
        for n in 0..steps {
            if let Err(e) = self.cpu.step() {
                self.halted = Some(e);
                return n;
            }
        }
        steps
    }

    /// Decrement the timers once.
    #[wasm_bindgen]
    pub fn tick(&mut self) {
        self.cpu.tick();
    }

    /// Reset to power-on state with the loaded program.
    #[wasm_bindgen]
    pub fn reset(&mut self) -> Result<(), JsError> {
        self.cpu.reset();
        self.halted = None;
        if !self.program.is_empty() {
            self.cpu.load_program(&self.program).map_err(js_error)?;
        }
        Ok(())
    }

    /// Set a keypad key's state.
    #[wasm_bindgen]
    pub fn set_key(&mut self, key: u8, pressed: bool) {
        self.cpu.keys.set(key, pressed);
    }

    /// Copy of the 64×32 frame buffer, one byte per pixel.
    #[wasm_bindgen]
    pub fn display(&self) -> js_sys::Uint8Array {
        js_sys::Uint8Array::from(self.cpu.display.as_slice())
    }

    /// Consume the pending-frame flag.
    #[wasm_bindgen]
    pub fn take_draw_flag(&mut self) -> bool {
        self.cpu.display.take_draw_flag()
    }

    /// True while the buzzer should sound.
    #[wasm_bindgen]
    pub fn sound_active(&self) -> bool {
        self.cpu.sound_active()
    }

    /// Error message of the fault that stopped the machine, if any.
    #[wasm_bindgen]
    pub fn fault(&self) -> Option<String> {
        self.halted.as_ref().map(|e| e.to_string())
    }

    /// Get cycle count.
    #[wasm_bindgen]
    pub fn cycles(&self) -> u64 {
        self.cpu.cycles
    }

    /// Get program counter.
    #[wasm_bindgen]
    pub fn pc(&self) -> u16 {
        self.cpu.regs.pc
    }

    /// Get registers as JSON string.
    #[wasm_bindgen]
    pub fn registers_json(&self) -> Result<String, JsError> {
        #[derive(Serialize)]
        struct View<'a> {
            v: &'a [u8; 16],
            i: u16,
            pc: u16,
            delay: u8,
            sound: u8,
            stack: &'a [u16],
            cycles: u64,
        }

        let view = View {
            v: &self.cpu.regs.v,
            i: self.cpu.regs.i,
            pc: self.cpu.regs.pc,
            delay: self.cpu.timers.delay,
            sound: self.cpu.timers.sound,
            stack: self.cpu.stack.entries(),
            cycles: self.cpu.cycles,
        };
        serde_json::to_string(&view).map_err(js_error)
    }
}

/// Disassemble a single instruction word.
#[wasm_bindgen]
pub fn wasm_disassemble(word: u16) -> String {
    disassemble_instruction(word)
}
