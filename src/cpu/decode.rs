//! Instruction decoder for CHIP-8.
//!
//! Every instruction is a big-endian 16-bit word. The top nibble selects
//! the instruction group; groups 0x0, 0x8, 0xE and 0xF select further on
//! the low nibble or low byte. Operand fields:
//!
//! ```text
//!   X   = bits 8-11   register index
//!   Y   = bits 4-7    register index
//!   NNN = bits 0-11   address
//!   NN  = bits 0-7    byte literal
//!   N   = bits 0-3    nibble literal (sprite height)
//! ```

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Decoded CHIP-8 instruction.
///
/// `x` and `y` are register indices and always lie in 0..=15.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    // ==================== Display ====================

    /// `00E0`: turn every pixel off.
    Cls,

    /// `DXYN`: draw an N-row sprite from memory at I to (VX, VY); VF = collision.
    Draw { x: u8, y: u8, n: u8 },

    // ==================== Control Flow ====================

    /// `00EE`: return from subroutine.
    Ret,

    /// `1NNN`: PC := NNN
    Jump { addr: u16 },

    /// `2NNN`: push PC, PC := NNN
    Call { addr: u16 },

    /// `BNNN`: PC := NNN + V0
    JumpOffset { addr: u16 },

    /// `3XNN`: skip if VX == NN
    SkipEqImm { x: u8, nn: u8 },

    /// `4XNN`: skip if VX != NN
    SkipNeImm { x: u8, nn: u8 },

    /// `5XY0`: skip if VX == VY
    SkipEqReg { x: u8, y: u8 },

    /// `9XY0`: skip if VX != VY
    SkipNeReg { x: u8, y: u8 },

    /// `EX9E`: skip if key VX is held
    SkipKeyPressed { x: u8 },

    /// `EXA1`: skip if key VX is not held
    SkipKeyReleased { x: u8 },

    /// `FX0A`: block until a key is held, VX := key
    WaitKey { x: u8 },

    // ==================== Register Loads ====================

    /// `6XNN`: VX := NN
    LoadImm { x: u8, nn: u8 },

    /// `7XNN`: VX := VX + NN (wrapping, VF untouched)
    AddImm { x: u8, nn: u8 },

    /// `8XY0`: VX := VY
    Move { x: u8, y: u8 },

    /// `CXNN`: VX := random & NN
    Random { x: u8, nn: u8 },

    // ==================== ALU ====================

    /// `8XY1`: VX := VX | VY
    Or { x: u8, y: u8 },

    /// `8XY2`: VX := VX & VY
    And { x: u8, y: u8 },

    /// `8XY3`: VX := VX ^ VY
    Xor { x: u8, y: u8 },

    /// `8XY4`: VX := VX + VY, VF = carry
    AddReg { x: u8, y: u8 },

    /// `8XY5`: VX := VX - VY, VF = no borrow
    SubReg { x: u8, y: u8 },

    /// `8XY6`: shift right by one, VF = bit shifted out
    ShiftRight { x: u8, y: u8 },

    /// `8XY7`: VX := VY - VX, VF = no borrow
    SubReverse { x: u8, y: u8 },

    /// `8XYE`: shift left by one, VF = bit shifted out
    ShiftLeft { x: u8, y: u8 },

    // ==================== Timers ====================

    /// `FX07`: VX := delay timer
    GetDelay { x: u8 },

    /// `FX15`: delay timer := VX
    SetDelay { x: u8 },

    /// `FX18`: sound timer := VX
    SetSound { x: u8 },

    // ==================== Index & Memory ====================

    /// `ANNN`: I := NNN
    LoadIndex { addr: u16 },

    /// `FX1E`: I := I + VX
    AddIndex { x: u8 },

    /// `FX29`: I := address of glyph VX
    LoadGlyph { x: u8 },

    /// `FX33`: memory[I..I+3] := BCD digits of VX
    StoreBcd { x: u8 },

    /// `FX55`: memory[I..=I+X] := V0..=VX
    StoreRegs { x: u8 },

    /// `FX65`: V0..=VX := memory[I..=I+X]
    LoadRegs { x: u8 },
}

impl Instruction {
    /// Whether this instruction can move PC past the next instruction.
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            Instruction::SkipEqImm { .. }
                | Instruction::SkipNeImm { .. }
                | Instruction::SkipEqReg { .. }
                | Instruction::SkipNeReg { .. }
                | Instruction::SkipKeyPressed { .. }
                | Instruction::SkipKeyReleased { .. }
        )
    }
}

/// Operand fields common to every instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fields {
    pub op: u8,
    pub x: u8,
    pub y: u8,
    pub n: u8,
    pub nn: u8,
    pub nnn: u16,
}

impl Fields {
    pub fn split(word: u16) -> Self {
        Self {
            op: (word >> 12) as u8,
            x: ((word >> 8) & 0xF) as u8,
            y: ((word >> 4) & 0xF) as u8,
            n: (word & 0xF) as u8,
            nn: (word & 0xFF) as u8,
            nnn: word & 0x0FFF,
        }
    }
}

/// Decode a 16-bit instruction word.
pub fn decode(word: u16) -> Result<Instruction, DecodeError> {
    let Fields { op, x, y, n, nn, nnn } = Fields::split(word);

    let instruction = match op {
        0x0 => match nn {
            0xE0 => Instruction::Cls,
            0xEE => Instruction::Ret,
            _ => return Err(DecodeError::UnknownOpcode(word)),
        },
        0x1 => Instruction::Jump { addr: nnn },
        0x2 => Instruction::Call { addr: nnn },
        0x3 => Instruction::SkipEqImm { x, nn },
        0x4 => Instruction::SkipNeImm { x, nn },
        0x5 => Instruction::SkipEqReg { x, y },
        0x6 => Instruction::LoadImm { x, nn },
        0x7 => Instruction::AddImm { x, nn },
        0x8 => match n {
            0x0 => Instruction::Move { x, y },
            0x1 => Instruction::Or { x, y },
            0x2 => Instruction::And { x, y },
            0x3 => Instruction::Xor { x, y },
            0x4 => Instruction::AddReg { x, y },
            0x5 => Instruction::SubReg { x, y },
            0x6 => Instruction::ShiftRight { x, y },
            0x7 => Instruction::SubReverse { x, y },
            0xE => Instruction::ShiftLeft { x, y },
            _ => return Err(DecodeError::UnknownOpcode(word)),
        },
        0x9 => Instruction::SkipNeReg { x, y },
        0xA => Instruction::LoadIndex { addr: nnn },
        0xB => Instruction::JumpOffset { addr: nnn },
        0xC => Instruction::Random { x, nn },
        0xD => Instruction::Draw { x, y, n },
        0xE => match nn {
            0x9E => Instruction::SkipKeyPressed { x },
            0xA1 => Instruction::SkipKeyReleased { x },
            _ => return Err(DecodeError::UnknownOpcode(word)),
        },
        0xF => match nn {
            0x07 => Instruction::GetDelay { x },
            0x0A => Instruction::WaitKey { x },
            0x15 => Instruction::SetDelay { x },
            0x18 => Instruction::SetSound { x },
            0x1E => Instruction::AddIndex { x },
            0x29 => Instruction::LoadGlyph { x },
            0x33 => Instruction::StoreBcd { x },
            0x55 => Instruction::StoreRegs { x },
            0x65 => Instruction::LoadRegs { x },
            _ => return Err(DecodeError::UnknownOpcode(word)),
        },
        _ => unreachable!("top nibble is four bits"),
    };

    Ok(instruction)
}

/// Encode an instruction back to its 16-bit word.
///
/// Register indices and literals are masked to their field widths.
pub fn encode(instr: &Instruction) -> u16 {
    fn xnn(op: u16, x: u8, nn: u8) -> u16 {
        op << 12 | (x as u16 & 0xF) << 8 | nn as u16
    }
    fn xyn(op: u16, x: u8, y: u8, n: u8) -> u16 {
        op << 12 | (x as u16 & 0xF) << 8 | (y as u16 & 0xF) << 4 | (n as u16 & 0xF)
    }
    fn nnn(op: u16, addr: u16) -> u16 {
        op << 12 | (addr & 0x0FFF)
    }

    match *instr {
        Instruction::Cls => 0x00E0,
        Instruction::Ret => 0x00EE,
        Instruction::Jump { addr } => nnn(0x1, addr),
        Instruction::Call { addr } => nnn(0x2, addr),
        Instruction::SkipEqImm { x, nn } => xnn(0x3, x, nn),
        Instruction::SkipNeImm { x, nn } => xnn(0x4, x, nn),
        Instruction::SkipEqReg { x, y } => xyn(0x5, x, y, 0x0),
        Instruction::LoadImm { x, nn } => xnn(0x6, x, nn),
        Instruction::AddImm { x, nn } => xnn(0x7, x, nn),
        Instruction::Move { x, y } => xyn(0x8, x, y, 0x0),
        Instruction::Or { x, y } => xyn(0x8, x, y, 0x1),
        Instruction::And { x, y } => xyn(0x8, x, y, 0x2),
        Instruction::Xor { x, y } => xyn(0x8, x, y, 0x3),
        Instruction::AddReg { x, y } => xyn(0x8, x, y, 0x4),
        Instruction::SubReg { x, y } => xyn(0x8, x, y, 0x5),
        Instruction::ShiftRight { x, y } => xyn(0x8, x, y, 0x6),
        Instruction::SubReverse { x, y } => xyn(0x8, x, y, 0x7),
        Instruction::ShiftLeft { x, y } => xyn(0x8, x, y, 0xE),
        Instruction::SkipNeReg { x, y } => xyn(0x9, x, y, 0x0),
        Instruction::LoadIndex { addr } => nnn(0xA, addr),
        Instruction::JumpOffset { addr } => nnn(0xB, addr),
        Instruction::Random { x, nn } => xnn(0xC, x, nn),
        Instruction::Draw { x, y, n } => xyn(0xD, x, y, n),
        Instruction::SkipKeyPressed { x } => xnn(0xE, x, 0x9E),
        Instruction::SkipKeyReleased { x } => xnn(0xE, x, 0xA1),
        Instruction::GetDelay { x } => xnn(0xF, x, 0x07),
        Instruction::WaitKey { x } => xnn(0xF, x, 0x0A),
        Instruction::SetDelay { x } => xnn(0xF, x, 0x15),
        Instruction::SetSound { x } => xnn(0xF, x, 0x18),
        Instruction::AddIndex { x } => xnn(0xF, x, 0x1E),
        Instruction::LoadGlyph { x } => xnn(0xF, x, 0x29),
        Instruction::StoreBcd { x } => xnn(0xF, x, 0x33),
        Instruction::StoreRegs { x } => xnn(0xF, x, 0x55),
        Instruction::LoadRegs { x } => xnn(0xF, x, 0x65),
    }
}

/// Errors that can occur during instruction decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unknown opcode: {0:#06X}")]
    UnknownOpcode(u16),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_fields() {
        let f = Fields::split(0xD12F);
        assert_eq!(f, Fields { op: 0xD, x: 0x1, y: 0x2, n: 0xF, nn: 0x2F, nnn: 0x12F });
    }

    #[test]
    fn test_decode_groups() {
        assert_eq!(decode(0x00E0), Ok(Instruction::Cls));
        assert_eq!(decode(0x00EE), Ok(Instruction::Ret));
        assert_eq!(decode(0x1ABC), Ok(Instruction::Jump { addr: 0xABC }));
        assert_eq!(decode(0x2300), Ok(Instruction::Call { addr: 0x300 }));
        assert_eq!(decode(0x6A02), Ok(Instruction::LoadImm { x: 0xA, nn: 0x02 }));
        assert_eq!(decode(0x8AB4), Ok(Instruction::AddReg { x: 0xA, y: 0xB }));
        assert_eq!(decode(0x8ABE), Ok(Instruction::ShiftLeft { x: 0xA, y: 0xB }));
        assert_eq!(decode(0xB200), Ok(Instruction::JumpOffset { addr: 0x200 }));
        assert_eq!(decode(0xC30F), Ok(Instruction::Random { x: 3, nn: 0x0F }));
        assert_eq!(decode(0xD015), Ok(Instruction::Draw { x: 0, y: 1, n: 5 }));
        assert_eq!(decode(0xE59E), Ok(Instruction::SkipKeyPressed { x: 5 }));
        assert_eq!(decode(0xE5A1), Ok(Instruction::SkipKeyReleased { x: 5 }));
        assert_eq!(decode(0xF70A), Ok(Instruction::WaitKey { x: 7 }));
        assert_eq!(decode(0xF265), Ok(Instruction::LoadRegs { x: 2 }));
    }

    #[test]
    fn test_decode_register_skips_ignore_low_nibble() {
        assert_eq!(decode(0x5127), Ok(Instruction::SkipEqReg { x: 1, y: 2 }));
        assert_eq!(decode(0x912F), Ok(Instruction::SkipNeReg { x: 1, y: 2 }));
    }

    #[test]
    fn test_decode_unknown_sub_selectors() {
        for word in [0x0000, 0x0123, 0x8128, 0x812F, 0xE100, 0xF0FF, 0xF130] {
            assert_eq!(decode(word), Err(DecodeError::UnknownOpcode(word)), "{:#06X}", word);
        }
    }

    #[test]
    fn test_every_decoded_word_encodes_back() {
        for word in 0..=u16::MAX {
            if let Ok(instr) = decode(word) {
                let canonical = encode(&instr);
                assert_eq!(decode(canonical), Ok(instr));
                // 00E0/00EE, 5XY_ and 9XY_ ignore some bits
                if !matches!(
                    instr,
                    Instruction::Cls | Instruction::Ret | Instruction::SkipEqReg { .. } | Instruction::SkipNeReg { .. }
                ) {
                    assert_eq!(canonical, word);
                }
            }
        }
    }

    #[test]
    fn test_is_skip() {
        assert!(Instruction::SkipEqImm { x: 0, nn: 0 }.is_skip());
        assert!(Instruction::SkipKeyReleased { x: 0 }.is_skip());
        assert!(!Instruction::Jump { addr: 0x200 }.is_skip());
    }
}
