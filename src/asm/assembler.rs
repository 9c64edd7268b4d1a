//! Simple assembler for machine programs.
//!
//! Syntax:
//! ```text
//! ; Comment (also: # comment)
//! START:            ; Define a label
//!     IN r0         ; r0 := INPUT
//!     AND r0, 1     ; r0 := 1 AND r0
//!     BZ r0, NIGHT  ; branch if r0 is zero
//!     DOUT 0b001001 ; OUTPUT := literal
//!     CALL WAIT     ; subroutine call
//!     B START
//! WAIT:
//!     RET
//!
//!     ORG 40        ; Pad with zero words up to address 40
//!     WORD 0x0E05   ; Raw 13-bit instruction word
//! ```
//!
//! Operands by mnemonic:
//! - `CALL t`, `B t`, `DOUT v`: target / value only
//! - `BZ r, t`: register and target
//! - `RET`: none
//! - `IN r`, `OUT r`: register only
//! - `ADD`/`SUB`/`AND`/`LD`/`XOR`/`IN_XOR r, v`: register and value

use crate::bits::{InstructionWord, Word8};
use crate::cpu::decode::{encode, Instruction, Mnemonic};
use crate::cpu::{Dest, PROGRAM_SIZE};
use std::collections::HashMap;
use thiserror::Error;

/// Assemble source code to a list of instruction words.
pub fn assemble(source: &str) -> Result<Vec<InstructionWord>, AssemblerError> {
    let mut asm = Assembler::new();
    asm.assemble(source)
}

/// A DATA operand that is either known now or resolved in pass 2.
enum Operand {
    Value(u8),
    Label(String),
}

/// The assembler state.
struct Assembler {
    /// Symbol table (label -> address).
    symbols: HashMap<String, usize>,
    /// Pending references (output_index, label, source_line).
    pending: Vec<(usize, String, usize)>,
    /// Output instructions.
    output: Vec<InstructionWord>,
}

impl Assembler {
    fn new() -> Self {
        Self {
            symbols: HashMap::new(),
            pending: Vec::new(),
            output: Vec::new(),
        }
    }

    fn assemble(&mut self, source: &str) -> Result<Vec<InstructionWord>, AssemblerError> {
        // Pass 1: Collect labels and generate code
        for (line_num, line) in source.lines().enumerate() {
            self.process_line(line, line_num + 1)?;
        }

        // Pass 2: Resolve forward references
        self.resolve_references()?;

        Ok(std::mem::take(&mut self.output))
    }

    fn process_line(&mut self, line: &str, line_num: usize) -> Result<(), AssemblerError> {
        // Remove comments
        let line = line.split([';', '#']).next().unwrap_or("").trim();
        if line.is_empty() {
            return Ok(());
        }

        // Check for label definition
        if let Some(colon_idx) = line.find(':') {
            let label = line[..colon_idx].trim().to_uppercase();
            if label.is_empty() || label.contains(char::is_whitespace) {
                return Err(AssemblerError::SyntaxError {
                    line: line_num,
                    message: format!("invalid label '{}'", &line[..colon_idx]),
                });
            }
            if self.symbols.insert(label.clone(), self.output.len()).is_some() {
                return Err(AssemblerError::DuplicateLabel { line: line_num, label });
            }

            // Process rest of line if any
            let rest = line[colon_idx + 1..].trim();
            if !rest.is_empty() {
                return self.process_instruction(rest, line_num);
            }
            return Ok(());
        }

        self.process_instruction(line, line_num)
    }

    fn process_instruction(&mut self, line: &str, line_num: usize) -> Result<(), AssemblerError> {
        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };
        let operands: Vec<&str> = if rest.is_empty() {
            Vec::new()
        } else {
            rest.split(',').map(str::trim).collect()
        };
        let keyword = head.to_uppercase();

        match keyword.as_str() {
            // Directives
            "ORG" => {
                let [value] = expect_operands::<1>(&operands, &keyword, line_num)?;
                let addr = parse_number(value, line_num)?;
                if addr > PROGRAM_SIZE as u32 {
                    return Err(AssemblerError::ValueOutOfRange { line: line_num, value: addr });
                }
                let addr = addr as usize;
                if addr < self.output.len() {
                    return Err(AssemblerError::SyntaxError {
                        line: line_num,
                        message: format!("ORG {} is behind the current address {}", addr, self.output.len()),
                    });
                }
                self.output.resize(addr, InstructionWord::zero());
            }

            "WORD" => {
                let [value] = expect_operands::<1>(&operands, &keyword, line_num)?;
                let raw = parse_number(value, line_num)?;
                if raw > InstructionWord::MASK as u32 {
                    return Err(AssemblerError::ValueOutOfRange { line: line_num, value: raw });
                }
                self.output.push(InstructionWord::from_raw(raw as u16));
            }

            // Instructions
            _ => {
                let mnemonic = Mnemonic::from_name(&keyword).ok_or_else(|| {
                    AssemblerError::UnknownMnemonic { line: line_num, mnemonic: head.to_string() }
                })?;
                self.parse_instruction(mnemonic, &operands, line_num)?;
            }
        }

        Ok(())
    }

    fn parse_instruction(&mut self, mnemonic: Mnemonic, operands: &[&str], line_num: usize)
        -> Result<(), AssemblerError>
    {
        let name = mnemonic.name();
        let (dest, data) = match mnemonic {
            Mnemonic::Ret => {
                expect_operands::<0>(operands, name, line_num)?;
                (Dest::Reg0, Operand::Value(0))
            }
            Mnemonic::Call | Mnemonic::B | Mnemonic::Dout => {
                let [target] = expect_operands::<1>(operands, name, line_num)?;
                (Dest::Reg0, parse_operand(target, line_num)?)
            }
            Mnemonic::In | Mnemonic::Out => {
                let [reg] = expect_operands::<1>(operands, name, line_num)?;
                (parse_register(reg, line_num)?, Operand::Value(0))
            }
            Mnemonic::Bz
            | Mnemonic::Add
            | Mnemonic::Sub
            | Mnemonic::And
            | Mnemonic::Ld
            | Mnemonic::Xor
            | Mnemonic::InXor => {
                let [reg, value] = expect_operands::<2>(operands, name, line_num)?;
                (parse_register(reg, line_num)?, parse_operand(value, line_num)?)
            }
        };

        let value = match data {
            Operand::Value(v) => v,
            Operand::Label(label) => {
                self.pending.push((self.output.len(), label, line_num));
                0 // Placeholder, resolved in pass 2
            }
        };

        self.output.push(encode(&Instruction::new(mnemonic, dest, Word8::new(value))));
        Ok(())
    }

    fn resolve_references(&mut self) -> Result<(), AssemblerError> {
        for (out_idx, label, line_num) in &self.pending {
            let addr = *self.symbols.get(label).ok_or_else(|| AssemblerError::UndefinedLabel {
                line: *line_num,
                label: label.clone(),
            })?;

            // Labels live inside the 64-word store, so they always fit DATA
            let word = self.output[*out_idx];
            self.output[*out_idx] =
                InstructionWord::from_fields(word.opcode(), word.dest(), Word8::new(addr as u8));
        }
        Ok(())
    }
}

fn expect_operands<'a, const N: usize>(operands: &[&'a str], mnemonic: &str, line_num: usize)
    -> Result<[&'a str; N], AssemblerError>
{
    <[&str; N]>::try_from(operands).map_err(|_| AssemblerError::SyntaxError {
        line: line_num,
        message: format!("{} takes {} operand(s), found {}", mnemonic, N, operands.len()),
    })
}

fn parse_register(operand: &str, line_num: usize) -> Result<Dest, AssemblerError> {
    match operand.to_lowercase().as_str() {
        "r0" | "reg0" => Ok(Dest::Reg0),
        "r1" | "reg1" => Ok(Dest::Reg1),
        _ => Err(AssemblerError::SyntaxError {
            line: line_num,
            message: format!("expected register r0 or r1, found '{}'", operand),
        }),
    }
}

fn parse_operand(operand: &str, line_num: usize) -> Result<Operand, AssemblerError> {
    if operand.starts_with(|c: char| c.is_ascii_digit()) {
        let value = parse_number(operand, line_num)?;
        let value = u8::try_from(value)
            .map_err(|_| AssemblerError::ValueOutOfRange { line: line_num, value })?;
        Ok(Operand::Value(value))
    } else if !operand.is_empty() && operand.chars().all(|c| c.is_alphanumeric() || c == '_') {
        Ok(Operand::Label(operand.to_uppercase()))
    } else {
        Err(AssemblerError::SyntaxError {
            line: line_num,
            message: format!("invalid operand '{}'", operand),
        })
    }
}

fn parse_number(operand: &str, line_num: usize) -> Result<u32, AssemblerError> {
    let operand = operand.trim();
    let parsed = if let Some(hex) = operand.strip_prefix("0x").or_else(|| operand.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16)
    } else if let Some(bin) = operand.strip_prefix("0b").or_else(|| operand.strip_prefix("0B")) {
        u32::from_str_radix(bin, 2)
    } else {
        operand.parse::<u32>()
    };

    parsed.map_err(|_| AssemblerError::SyntaxError {
        line: line_num,
        message: format!("invalid number '{}'", operand),
    })
}

/// Errors that can occur during assembly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblerError {
    #[error("syntax error on line {line}: {message}")]
    SyntaxError { line: usize, message: String },

    #[error("unknown mnemonic on line {line}: {mnemonic}")]
    UnknownMnemonic { line: usize, mnemonic: String },

    #[error("undefined label on line {line}: {label}")]
    UndefinedLabel { line: usize, label: String },

    #[error("duplicate label on line {line}: {label}")]
    DuplicateLabel { line: usize, label: String },

    #[error("value out of range on line {line}: {value}")]
    ValueOutOfRange { line: usize, value: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asm::disasm::disassemble_instruction;

    #[test]
    fn test_assemble_simple() {
        let source = r#"
            ; Simple test program
            LD r0, 5
            ADD r0, 3
            OUT r0
        "#;

        let result = assemble(source).unwrap();
        assert_eq!(result.len(), 3);
        assert_eq!(result[0].to_string(), "0111000000101");
        assert_eq!(result[1].to_string(), "0100000000011");
        assert_eq!(disassemble_instruction(result[2]), "OUT r0");
    }

    #[test]
    fn test_assemble_with_labels() {
        let source = r#"
        START:
            CALL SUB1   # forward reference
            B START
        SUB1: RET
        "#;

        let result = assemble(source).unwrap();
        assert_eq!(result.len(), 3);
        assert_eq!(disassemble_instruction(result[0]), "CALL 2");
        assert_eq!(disassemble_instruction(result[1]), "B 0");
        assert_eq!(disassemble_instruction(result[2]), "RET");
    }

    #[test]
    fn test_number_formats() {
        let result = assemble("DOUT 0b100100\nLD r1, 0x1F\nXOR r1, 255").unwrap();
        assert_eq!(result[0].data().value(), 0b100100);
        assert_eq!(result[1].data().value(), 0x1F);
        assert!(result[1].dest());
        assert_eq!(result[2].data().value(), 255);
    }

    #[test]
    fn test_org_and_word() {
        let result = assemble("B 4\nORG 4\nWORD 0x0E05").unwrap();
        assert_eq!(result.len(), 5);
        assert_eq!(result[1].raw(), 0);
        assert_eq!(result[4].raw(), 0x0E05);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            assemble("NOP"),
            Err(AssemblerError::UnknownMnemonic { line: 1, .. })
        ));
        assert!(matches!(
            assemble("B MISSING"),
            Err(AssemblerError::UndefinedLabel { line: 1, .. })
        ));
        assert!(matches!(
            assemble("LD r0, 256"),
            Err(AssemblerError::ValueOutOfRange { line: 1, value: 256 })
        ));
        assert!(matches!(
            assemble("ADD r2, 1"),
            Err(AssemblerError::SyntaxError { line: 1, .. })
        ));
        assert!(matches!(
            assemble("\nRET r0"),
            Err(AssemblerError::SyntaxError { line: 2, .. })
        ));
        assert!(matches!(
            assemble("A: RET\nA: RET"),
            Err(AssemblerError::DuplicateLabel { line: 2, .. })
        ));
    }
}
