//! Disassembler for machine programs.
//!
//! Converts 13-bit instruction words back to readable assembly.

use crate::bits::InstructionWord;
use crate::cpu::decode::{decode, Instruction, Mnemonic};

/// Disassemble a single instruction to text.
pub fn disassemble_instruction(word: InstructionWord) -> String {
    match decode(word) {
        Ok(decoded) => format_instruction(&decoded),
        Err(_) => format!("??? {}", word),
    }
}

/// Disassemble a slice of instructions.
pub fn disassemble(words: &[InstructionWord]) -> String {
    let mut output = String::new();
    output.push_str("; Disassembly\n");
    output.push_str("; -----------\n\n");

    for (addr, word) in words.iter().enumerate() {
        let line = disassemble_instruction(*word);
        output.push_str(&format!("{:02}: {:<16} ; {}\n", addr, line, word));
    }

    output
}

/// Format a decoded instruction as assembly text.
///
/// Branches print only their target; instructions that ignore DATA print
/// only the register.
fn format_instruction(instr: &Instruction) -> String {
    let data = instr.data.value();
    match instr.mnemonic {
        Mnemonic::Call | Mnemonic::B => format!("{} {}", instr.mnemonic, data),
        Mnemonic::Bz => format!("BZ {}, {}", instr.dest, data),
        Mnemonic::Ret => "RET".to_string(),
        Mnemonic::Out | Mnemonic::In => format!("{} {}", instr.mnemonic, instr.dest),
        Mnemonic::Dout => format!("DOUT {}", data),
        Mnemonic::Add
        | Mnemonic::Sub
        | Mnemonic::And
        | Mnemonic::Ld
        | Mnemonic::Xor
        | Mnemonic::InXor => format!("{} {}, {}", instr.mnemonic, instr.dest, data),
    }
}
