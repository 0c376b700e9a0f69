//! CHIP-8 registers and call stack.
//!
//! - V0-VF: sixteen 8-bit general registers (VF doubles as the flag output)
//! - I: 16-bit index register
//! - PC: 16-bit program counter
//! - a 16-entry return-address stack

use crate::cpu::memory::PROGRAM_START;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Index of the flag register, VF.
pub const FLAG: usize = 0xF;

/// Maximum number of nested calls.
pub const STACK_DEPTH: usize = 16;

/// The register file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    /// V0-VF general purpose registers.
    pub v: [u8; 16],

    /// I: index register, base address for memory-indexed instructions.
    pub i: u16,

    /// PC: address of the next instruction to fetch.
    pub pc: u16,
}

impl Registers {
    /// Create a register file with everything zeroed and PC at the program start.
    pub fn new() -> Self {
        Self {
            v: [0; 16],
            i: 0,
            pc: PROGRAM_START as u16,
        }
    }

    /// Reset all registers and put PC back at the program start.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Write VF.
    #[inline]
    pub fn set_flag(&mut self, set: bool) {
        self.v[FLAG] = set as u8;
    }

    /// Step PC past one instruction.
    /// Returns the old value.
    pub fn advance_pc(&mut self) -> u16 {
        let old = self.pc;
        self.pc = self.pc.wrapping_add(2);
        old
    }

    /// Skip the next instruction.
    pub fn skip(&mut self) {
        self.pc = self.pc.wrapping_add(2);
    }

    /// Point PC back at the instruction that was just fetched.
    pub fn rewind(&mut self) {
        self.pc = self.pc.wrapping_sub(2);
    }

    /// Set the program counter to an absolute address.
    pub fn jump(&mut self, addr: u16) {
        self.pc = addr;
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed-capacity return-address stack.
///
/// `depth` counts the live entries, so an empty stack has depth 0 and the
/// top entry lives at `slots[depth - 1]`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StackImage")]
pub struct Stack {
    slots: [u16; STACK_DEPTH],
    depth: usize,
}

/// Unchecked serialized form of [`Stack`].
#[derive(Deserialize)]
struct StackImage {
    slots: [u16; STACK_DEPTH],
    depth: usize,
}

impl TryFrom<StackImage> for Stack {
    type Error = String;

    fn try_from(image: StackImage) -> Result<Self, Self::Error> {
        if image.depth > STACK_DEPTH {
            return Err(format!("stack depth {} exceeds {}", image.depth, STACK_DEPTH));
        }
        Ok(Self { slots: image.slots, depth: image.depth })
    }
}

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a return address.
    pub fn push(&mut self, addr: u16) -> Result<(), StackError> {
        if self.depth == STACK_DEPTH {
            return Err(StackError::Overflow);
        }
        self.slots[self.depth] = addr;
        self.depth += 1;
        Ok(())
    }

    /// Pop the most recent return address.
    pub fn pop(&mut self) -> Result<u16, StackError> {
        if self.depth == 0 {
            return Err(StackError::Underflow);
        }
        self.depth -= 1;
        Ok(self.slots[self.depth])
    }

    /// Number of live entries.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_empty(&self) -> bool {
        self.depth == 0
    }

    /// Live entries, oldest first.
    pub fn entries(&self) -> &[u16] {
        &self.slots[..self.depth]
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Errors raised by stack operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StackError {
    #[error("stack overflow: call nesting exceeds {} entries", STACK_DEPTH)]
    Overflow,

    #[error("stack underflow: return with an empty stack")]
    Underflow,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_registers() {
        let regs = Registers::new();
        assert_eq!(regs.pc, 0x200);
        assert_eq!(regs.i, 0);
        assert_eq!(regs.v, [0; 16]);
    }

    #[test]
    fn test_advance_pc() {
        let mut regs = Registers::new();
        let old = regs.advance_pc();
        assert_eq!(old, 0x200);
        assert_eq!(regs.pc, 0x202);

        regs.skip();
        assert_eq!(regs.pc, 0x204);

        regs.rewind();
        assert_eq!(regs.pc, 0x202);
    }

    #[test]
    fn test_set_flag() {
        let mut regs = Registers::new();
        regs.set_flag(true);
        assert_eq!(regs.v[FLAG], 1);
        regs.set_flag(false);
        assert_eq!(regs.v[FLAG], 0);
    }

    #[test]
    fn test_stack_lifo() {
        let mut stack = Stack::new();
        stack.push(0x202).unwrap();
        stack.push(0x40A).unwrap();
        assert_eq!(stack.entries(), &[0x202, 0x40A]);

        assert_eq!(stack.pop(), Ok(0x40A));
        assert_eq!(stack.pop(), Ok(0x202));
        assert!(stack.is_empty());
    }

    #[test]
    fn test_stack_depth_checked_on_load() {
        let mut stack = Stack::new();
        stack.push(0x202).unwrap();
        let json = serde_json::to_value(&stack).unwrap();
        assert_eq!(serde_json::from_value::<Stack>(json.clone()).unwrap(), stack);

        let mut deep = json;
        deep["depth"] = serde_json::json!(STACK_DEPTH + 1);
        assert!(serde_json::from_value::<Stack>(deep).is_err());
    }

    #[test]
    fn test_stack_overflow() {
        let mut stack = Stack::new();
        for n in 0..STACK_DEPTH {
            stack.push(n as u16).unwrap();
        }
        assert_eq!(stack.push(0xFFF), Err(StackError::Overflow));
        assert_eq!(stack.depth(), STACK_DEPTH);
    }

    #[test]
    fn test_stack_underflow() {
        let mut stack = Stack::new();
        assert_eq!(stack.pop(), Err(StackError::Underflow));
        assert_eq!(stack.depth(), 0);
    }
}
