//! CPU execution engine for CHIP-8.
//!
//! Implements the fetch-decode-execute cycle and all instruction behaviors.
//! One call to [`Cpu::step`] runs exactly one instruction; one call to
//! [`Cpu::tick`] decrements the timers once. Pacing both is the host's job.

use crate::cpu::{Display, Keypad, Memory, Quirks, Registers, Stack, Timers};
use crate::cpu::decode::{self, Instruction, DecodeError};
use crate::cpu::font;
use crate::cpu::memory::{MemoryError, PROGRAM_START};
use crate::cpu::quirks::ShiftSource;
use crate::cpu::registers::{StackError, FLAG};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// What a successful [`Cpu::step`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepOutcome {
    /// The instruction ran to completion.
    Executed(Instruction),
    /// `FX0A` found no key held; PC still points at it.
    WaitingForKey,
    /// The word did not decode. PC moved past it and nothing else changed.
    Unknown(u16),
}

/// The CHIP-8 machine.
#[derive(Clone, Serialize, Deserialize)]
pub struct Cpu {
    /// CPU registers.
    pub regs: Registers,
    /// Main memory.
    pub mem: Memory,
    /// Return-address stack.
    pub stack: Stack,
    /// Delay and sound timers.
    pub timers: Timers,
    /// Frame buffer.
    pub display: Display,
    /// Key state, written by the host.
    pub keys: Keypad,
    /// Compatibility switches.
    pub quirks: Quirks,
    /// Instruction count (for profiling).
    pub cycles: u64,
    /// Source for `CXNN`. Not part of a snapshot.
    #[serde(skip, default = "StdRng::from_entropy")]
    rng: StdRng,
}

impl Cpu {
    /// Create a powered-on machine with an entropy-seeded random source.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Create a machine whose `CXNN` results are reproducible.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        let mut cpu = Self {
            regs: Registers::new(),
            mem: Memory::new(),
            stack: Stack::new(),
            timers: Timers::new(),
            display: Display::new(),
            keys: Keypad::new(),
            quirks: Quirks::default(),
            cycles: 0,
            rng,
        };
        cpu.mem.load_font();
        cpu
    }

    /// Builder-style quirk selection.
    pub fn with_quirks(mut self, quirks: Quirks) -> Self {
        self.quirks = quirks;
        self
    }

    /// Reseed the random source.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Return to power-on state: everything zeroed, PC at 0x200, glyphs loaded.
    ///
    /// Quirks and the random source are host settings and survive a reset.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.mem.clear();
        self.mem.load_font();
        self.stack.clear();
        self.timers = Timers::new();
        self.display.reset();
        self.keys.release_all();
        self.cycles = 0;
        log::debug!("machine reset");
    }

    /// Load a program image at 0x200.
    pub fn load_program(&mut self, program: &[u8]) -> Result<(), CpuError> {
        self.mem.load_program(PROGRAM_START, program)?;
        log::debug!("loaded {} byte program at {:#05X}", program.len(), PROGRAM_START);
        Ok(())
    }

    /// Read the instruction word at PC without executing it.
    pub fn fetch(&self) -> Result<u16, CpuError> {
        Ok(self.mem.read_word(self.regs.pc as usize)?)
    }

    /// Execute a single instruction.
    ///
    /// Fatal conditions come back as `Err`; an undecodable word is reported
    /// through [`StepOutcome::Unknown`] and logged, and execution may go on.
    pub fn step(&mut self) -> Result<StepOutcome, CpuError> {
        // Fetch
        let pc = self.regs.pc;
        let word = self.fetch()?;

        // Advance PC before execute (jumps override, skips add to it)
        self.regs.advance_pc();
        self.cycles += 1;

        // Decode
        let instr = match decode::decode(word) {
            Ok(instr) => instr,
            Err(DecodeError::UnknownOpcode(word)) => {
                log::warn!("unknown instruction {:#06X} at {:#05X}", word, pc);
                return Ok(StepOutcome::Unknown(word));
            }
        };
        log::trace!("{:#05X}: {:04X} {:?}", pc, word, instr);

        // Execute
        self.execute(instr).map_err(|e| {
            log::error!("{} at {:#05X} ({:04X})", e, pc, word);
            e
        })
    }

    /// Decrement the delay and sound timers once.
    pub fn tick(&mut self) {
        self.timers.tick();
    }

    /// Run at most `max_cycles` instructions, stopping early on a fatal error.
    ///
    /// Returns the number of steps taken. Steps spent waiting for a key and
    /// on unknown words count.
    pub fn run_limited(&mut self, max_cycles: u64) -> Result<u64, CpuError> {
        for n in 0..max_cycles {
            if let Err(e) = self.step() {
                log::debug!("stopped after {} steps", n);
                return Err(e);
            }
        }
        Ok(max_cycles)
    }

    /// Execute a decoded instruction.
    fn execute(&mut self, instr: Instruction) -> Result<StepOutcome, CpuError> {
        match instr {
            // ==================== Display ====================

            Instruction::Cls => {
                self.display.clear();
            }

            Instruction::Draw { x, y, n } => {
                let rows = self.mem.read_range(self.regs.i as usize, n as usize)?;
                let (vx, vy) = (self.v(x), self.v(y));
                let collision = self.display.draw_sprite(vx, vy, rows);
                self.regs.set_flag(collision);
            }

            // ==================== Control Flow ====================

            Instruction::Ret => {
                let addr = self.stack.pop()?;
                self.regs.jump(addr);
            }

            Instruction::Jump { addr } => {
                self.regs.jump(addr);
            }

            Instruction::Call { addr } => {
                self.stack.push(self.regs.pc)?;
                self.regs.jump(addr);
            }

            Instruction::JumpOffset { addr } => {
                self.regs.jump(addr + self.regs.v[0] as u16);
            }

            Instruction::SkipEqImm { x, nn } => {
                self.skip_if(self.v(x) == nn);
            }

            Instruction::SkipNeImm { x, nn } => {
                self.skip_if(self.v(x) != nn);
            }

            Instruction::SkipEqReg { x, y } => {
                self.skip_if(self.v(x) == self.v(y));
            }

            Instruction::SkipNeReg { x, y } => {
                self.skip_if(self.v(x) != self.v(y));
            }

            Instruction::SkipKeyPressed { x } => {
                let key = self.key_operand(x);
                self.skip_if(self.keys.is_pressed(key));
            }

            Instruction::SkipKeyReleased { x } => {
                let key = self.key_operand(x);
                self.skip_if(!self.keys.is_pressed(key));
            }

            Instruction::WaitKey { x } => match self.keys.first_pressed() {
                Some(key) => self.set_v(x, key),
                None => {
                    self.regs.rewind();
                    return Ok(StepOutcome::WaitingForKey);
                }
            },

            // ==================== Register Loads ====================

            Instruction::LoadImm { x, nn } => {
                self.set_v(x, nn);
            }

            Instruction::AddImm { x, nn } => {
                self.set_v(x, self.v(x).wrapping_add(nn));
            }

            Instruction::Move { x, y } => {
                self.set_v(x, self.v(y));
            }

            Instruction::Random { x, nn } => {
                let byte: u8 = self.rng.gen();
                self.set_v(x, byte & nn);
            }

            // ==================== ALU ====================
            //
            // Flag-producing operations write VF last, so with X = F the flag
            // is what remains.

            Instruction::Or { x, y } => {
                self.set_v(x, self.v(x) | self.v(y));
            }

            Instruction::And { x, y } => {
                self.set_v(x, self.v(x) & self.v(y));
            }

            Instruction::Xor { x, y } => {
                self.set_v(x, self.v(x) ^ self.v(y));
            }

            Instruction::AddReg { x, y } => {
                let (sum, carry) = self.v(x).overflowing_add(self.v(y));
                self.set_v(x, sum);
                self.regs.set_flag(carry);
            }

            Instruction::SubReg { x, y } => {
                let (a, b) = (self.v(x), self.v(y));
                self.set_v(x, a.wrapping_sub(b));
                self.regs.set_flag(a >= b);
            }

            Instruction::SubReverse { x, y } => {
                let (a, b) = (self.v(x), self.v(y));
                self.set_v(x, b.wrapping_sub(a));
                self.regs.set_flag(b >= a);
            }

            Instruction::ShiftRight { x, y } => {
                let source = self.shift_operand(x, y);
                self.set_v(x, source >> 1);
                self.regs.set_flag(source & 0x01 != 0);
            }

            Instruction::ShiftLeft { x, y } => {
                let source = self.shift_operand(x, y);
                self.set_v(x, source << 1);
                self.regs.set_flag(source & 0x80 != 0);
            }

            // ==================== Timers ====================

            Instruction::GetDelay { x } => {
                self.set_v(x, self.timers.delay);
            }

            Instruction::SetDelay { x } => {
                self.timers.delay = self.v(x);
            }

            Instruction::SetSound { x } => {
                self.timers.sound = self.v(x);
            }

            // ==================== Index & Memory ====================

            Instruction::LoadIndex { addr } => {
                self.regs.i = addr;
            }

            Instruction::AddIndex { x } => {
                self.regs.i = self.regs.i.wrapping_add(self.v(x) as u16);
            }

            Instruction::LoadGlyph { x } => {
                self.regs.i = font::glyph_address(self.v(x));
            }

            Instruction::StoreBcd { x } => {
                let value = self.v(x);
                let digits = [value / 100, (value / 10) % 10, value % 10];
                self.mem.write_range(self.regs.i as usize, &digits)?;
            }

            Instruction::StoreRegs { x } => {
                let count = x as usize + 1;
                let regs = self.regs.v;
                self.mem.write_range(self.regs.i as usize, &regs[..count])?;
            }

            Instruction::LoadRegs { x } => {
                let count = x as usize + 1;
                let bytes = self.mem.read_range(self.regs.i as usize, count)?;
                self.regs.v[..count].copy_from_slice(bytes);
            }
        }

        Ok(StepOutcome::Executed(instr))
    }

    #[inline]
    fn v(&self, index: u8) -> u8 {
        self.regs.v[index as usize]
    }

    #[inline]
    fn set_v(&mut self, index: u8, value: u8) {
        self.regs.v[index as usize] = value;
    }

    #[inline]
    fn skip_if(&mut self, condition: bool) {
        if condition {
            self.regs.skip();
        }
    }

    /// Key named by `V[x]`. Only the low nibble selects a key.
    fn key_operand(&self, x: u8) -> u8 {
        let value = self.v(x);
        if value > 0x0F {
            log::warn!("key register V{:X} holds {:#04X}, using key {:X}", x, value, value & 0x0F);
        }
        value & 0x0F
    }

    fn shift_operand(&self, x: u8, y: u8) -> u8 {
        match self.quirks.shift_source {
            ShiftSource::Vy => self.v(y),
            ShiftSource::Vx => self.v(x),
        }
    }

    /// Value of VF.
    pub fn flag(&self) -> u8 {
        self.regs.v[FLAG]
    }

    /// True while the buzzer should sound.
    pub fn sound_active(&self) -> bool {
        self.timers.sound_active()
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("cycles", &self.cycles)
            .field("regs", &self.regs)
            .field("stack", &self.stack)
            .field("timers", &self.timers)
            .field("display", &self.display)
            .finish()
    }
}

/// Errors that stop the current step.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("out of bounds: {len} byte(s) at {addr:#05X}")]
    OutOfBounds { addr: usize, len: usize },

    #[error("stack overflow")]
    StackOverflow,

    #[error("stack underflow")]
    StackUnderflow,

    #[error("program size {size} exceeds available space {available}")]
    ProgramTooLarge { size: usize, available: usize },
}

impl From<MemoryError> for CpuError {
    fn from(e: MemoryError) -> Self {
        match e {
            MemoryError::OutOfBounds { addr, len } => CpuError::OutOfBounds { addr, len },
            MemoryError::ProgramTooLarge { size, available } => {
                CpuError::ProgramTooLarge { size, available }
            }
        }
    }
}

impl From<StackError> for CpuError {
    fn from(e: StackError) -> Self {
        match e {
            StackError::Overflow => CpuError::StackOverflow,
            StackError::Underflow => CpuError::StackUnderflow,
        }
    }
}
