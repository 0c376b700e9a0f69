//! Disassembler for CHIP-8 programs.
//!
//! Converts instruction words back to readable assembly, using the common
//! Cowgod-style mnemonics.

use crate::cpu::decode::{decode, Instruction};

/// Disassemble a single instruction word to text.
pub fn disassemble_instruction(word: u16) -> String {
    match decode(word) {
        Ok(decoded) => format_instruction(&decoded),
        Err(_) => format!("???? ; {:04X}", word),
    }
}

/// Disassemble a program image loaded at `origin`.
pub fn disassemble(bytes: &[u8], origin: u16) -> String {
    let mut output = String::new();
    output.push_str("; CHIP-8 Disassembly\n");
    output.push_str("; ------------------\n\n");

    for (n, pair) in bytes.chunks(2).enumerate() {
        let addr = origin as usize + n * 2;
        let word = u16::from_be_bytes([pair[0], pair.get(1).copied().unwrap_or(0)]);
        let line = disassemble_instruction(word);
        output.push_str(&format!("{:03X}: {:04X}  {}\n", addr, word, line));
    }

    output
}

/// Format a decoded instruction as assembly text.
pub fn format_instruction(instr: &Instruction) -> String {
    match *instr {
        // Display
        Instruction::Cls => "CLS".to_string(),
        Instruction::Draw { x, y, n } => format!("DRW V{:X}, V{:X}, {}", x, y, n),

        // Control
        Instruction::Ret => "RET".to_string(),
        Instruction::Jump { addr } => format!("JP {:03X}", addr),
        Instruction::Call { addr } => format!("CALL {:03X}", addr),
        Instruction::JumpOffset { addr } => format!("JP V0, {:03X}", addr),
        Instruction::SkipEqImm { x, nn } => format!("SE V{:X}, {:02X}", x, nn),
        Instruction::SkipNeImm { x, nn } => format!("SNE V{:X}, {:02X}", x, nn),
        Instruction::SkipEqReg { x, y } => format!("SE V{:X}, V{:X}", x, y),
        Instruction::SkipNeReg { x, y } => format!("SNE V{:X}, V{:X}", x, y),
        Instruction::SkipKeyPressed { x } => format!("SKP V{:X}", x),
        Instruction::SkipKeyReleased { x } => format!("SKNP V{:X}", x),
        Instruction::WaitKey { x } => format!("LD V{:X}, K", x),

        // Loads
        Instruction::LoadImm { x, nn } => format!("LD V{:X}, {:02X}", x, nn),
        Instruction::AddImm { x, nn } => format!("ADD V{:X}, {:02X}", x, nn),
        Instruction::Move { x, y } => format!("LD V{:X}, V{:X}", x, y),
        Instruction::Random { x, nn } => format!("RND V{:X}, {:02X}", x, nn),

        // ALU
        Instruction::Or { x, y } => format!("OR V{:X}, V{:X}", x, y),
        Instruction::And { x, y } => format!("AND V{:X}, V{:X}", x, y),
        Instruction::Xor { x, y } => format!("XOR V{:X}, V{:X}", x, y),
        Instruction::AddReg { x, y } => format!("ADD V{:X}, V{:X}", x, y),
        Instruction::SubReg { x, y } => format!("SUB V{:X}, V{:X}", x, y),
        Instruction::ShiftRight { x, y } => format!("SHR V{:X}, V{:X}", x, y),
        Instruction::SubReverse { x, y } => format!("SUBN V{:X}, V{:X}", x, y),
        Instruction::ShiftLeft { x, y } => format!("SHL V{:X}, V{:X}", x, y),

        // Timers
        Instruction::GetDelay { x } => format!("LD V{:X}, DT", x),
        Instruction::SetDelay { x } => format!("LD DT, V{:X}", x),
        Instruction::SetSound { x } => format!("LD ST, V{:X}", x),

        // Index & memory
        Instruction::LoadIndex { addr } => format!("LD I, {:03X}", addr),
        Instruction::AddIndex { x } => format!("ADD I, V{:X}", x),
        Instruction::LoadGlyph { x } => format!("LD F, V{:X}", x),
        Instruction::StoreBcd { x } => format!("LD B, V{:X}", x),
        Instruction::StoreRegs { x } => format!("LD [I], V{:X}", x),
        Instruction::LoadRegs { x } => format!("LD V{:X}, [I]", x),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disassemble_cls() {
        assert_eq!(disassemble_instruction(0x00E0), "CLS");
    }

    #[test]
    fn test_disassemble_operands() {
        assert_eq!(disassemble_instruction(0x8AB4), "ADD VA, VB");
        assert_eq!(disassemble_instruction(0xD125), "DRW V1, V2, 5");
        assert_eq!(disassemble_instruction(0xA2F0), "LD I, 2F0");
        assert_eq!(disassemble_instruction(0xF50A), "LD V5, K");
        assert_eq!(disassemble_instruction(0xB123), "JP V0, 123");
    }

    #[test]
    fn test_disassemble_unknown() {
        assert_eq!(disassemble_instruction(0xE1FF), "???? ; E1FF");
    }

    #[test]
    fn test_listing() {
        let listing = disassemble(&[0x6A, 0x02, 0x12, 0x00], 0x200);
        assert!(listing.contains("200: 6A02  LD VA, 02"));
        assert!(listing.contains("202: 1200  JP 200"));
    }
}
