//! Two-stage instruction decoder.
//!
//! Stage one maps the 4-bit OPCODE field to a [`Mnemonic`]; 13 of the 16
//! codes are defined. Stage two maps every mnemonic to a fixed 10-bit
//! [`ControlWord`], the micro-architectural signals that drive one cycle.
//! Both stages are exhaustive `match` tables.

use crate::bits::{AluOp, InstructionWord, Word8};
use crate::cpu::registers::Dest;
use serde::{Serialize, Deserialize};
use std::fmt;
use thiserror::Error;

/// The 13 operations of the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mnemonic {
    // ==================== Control Flow ====================

    /// Push PC+1, jump to DATA
    Call,
    /// Pop, jump to the old top of stack
    Ret,
    /// Jump to DATA if the selected register is zero
    Bz,
    /// Unconditional jump to DATA
    B,

    // ==================== Register ALU ====================

    /// reg := DATA + reg
    Add,
    /// reg := DATA - reg
    Sub,
    /// reg := DATA AND reg
    And,
    /// reg := DATA
    Ld,

    // ==================== I/O ====================

    /// OUTPUT := reg
    Out,
    /// reg := INPUT
    In,
    /// OUTPUT := DATA
    Dout,
    /// reg := DATA XOR reg
    Xor,
    /// reg := DATA XOR INPUT
    InXor,
}

impl Mnemonic {
    /// All mnemonics in opcode order.
    pub const ALL: [Mnemonic; 13] = [
        Mnemonic::Call,
        Mnemonic::Ret,
        Mnemonic::Bz,
        Mnemonic::B,
        Mnemonic::Add,
        Mnemonic::Sub,
        Mnemonic::And,
        Mnemonic::Ld,
        Mnemonic::Out,
        Mnemonic::In,
        Mnemonic::Dout,
        Mnemonic::Xor,
        Mnemonic::InXor,
    ];

    /// Decode a 4-bit opcode.
    pub fn from_opcode(opcode: u8) -> Result<Self, DecodeError> {
        let mnemonic = match opcode {
            0b0000 => Mnemonic::Call,
            0b0001 => Mnemonic::Ret,
            0b0010 => Mnemonic::Bz,
            0b0011 => Mnemonic::B,
            0b0100 => Mnemonic::Add,
            0b0101 => Mnemonic::Sub,
            0b0110 => Mnemonic::And,
            0b0111 => Mnemonic::Ld,
            0b1000 => Mnemonic::Out,
            0b1001 => Mnemonic::In,
            0b1010 => Mnemonic::Dout,
            0b1011 => Mnemonic::Xor,
            0b1100 => Mnemonic::InXor,
            _ => return Err(DecodeError::InvalidOpcode(opcode)),
        };
        Ok(mnemonic)
    }

    /// The 4-bit opcode of this mnemonic.
    pub const fn opcode(self) -> u8 {
        match self {
            Mnemonic::Call => 0b0000,
            Mnemonic::Ret => 0b0001,
            Mnemonic::Bz => 0b0010,
            Mnemonic::B => 0b0011,
            Mnemonic::Add => 0b0100,
            Mnemonic::Sub => 0b0101,
            Mnemonic::And => 0b0110,
            Mnemonic::Ld => 0b0111,
            Mnemonic::Out => 0b1000,
            Mnemonic::In => 0b1001,
            Mnemonic::Dout => 0b1010,
            Mnemonic::Xor => 0b1011,
            Mnemonic::InXor => 0b1100,
        }
    }

    /// The assembly name, as printed in listings.
    pub const fn name(self) -> &'static str {
        match self {
            Mnemonic::Call => "CALL",
            Mnemonic::Ret => "RET",
            Mnemonic::Bz => "BZ",
            Mnemonic::B => "B",
            Mnemonic::Add => "ADD",
            Mnemonic::Sub => "SUB",
            Mnemonic::And => "AND",
            Mnemonic::Ld => "LD",
            Mnemonic::Out => "OUT",
            Mnemonic::In => "IN",
            Mnemonic::Dout => "DOUT",
            Mnemonic::Xor => "XOR",
            Mnemonic::InXor => "IN_XOR",
        }
    }

    /// Look up a mnemonic by name, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(name))
    }

    /// The control word this mnemonic decodes to.
    pub const fn control_word(self) -> ControlWord {
        use AddrSrc::*;
        use AluSrc::*;
        use StackOp::*;

        let (stack_op, addr_src, alu_op, alu_src, reg_write, out_latch) = match self {
            Mnemonic::Call => (Push, Data, AluOp::Zero, Register, false, false),
            Mnemonic::Ret => (Pop, TopOfStack, AluOp::Zero, Register, false, false),
            Mnemonic::Bz => (Hold, DataIfZero, AluOp::PassB, Register, false, false),
            Mnemonic::B => (Hold, Data, AluOp::Zero, Register, false, false),
            Mnemonic::Add => (Hold, NextPc, AluOp::Add, Register, true, false),
            Mnemonic::Sub => (Hold, NextPc, AluOp::Sub, Register, true, false),
            Mnemonic::And => (Hold, NextPc, AluOp::And, Register, true, false),
            Mnemonic::Ld => (Hold, NextPc, AluOp::PassA, Register, true, false),
            Mnemonic::Out => (Hold, NextPc, AluOp::PassB, Register, false, true),
            Mnemonic::In => (Hold, NextPc, AluOp::PassB, Input, true, false),
            Mnemonic::Dout => (Hold, NextPc, AluOp::PassA, Register, false, true),
            Mnemonic::Xor => (Hold, NextPc, AluOp::Xor, Register, true, false),
            Mnemonic::InXor => (Hold, NextPc, AluOp::Xor, Input, true, false),
        };

        ControlWord { stack_op, addr_src, alu_op, alu_src, reg_write, out_latch }
    }
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Stack action taken during a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StackOp {
    Hold,
    Push,
    Pop,
}

impl StackOp {
    pub const fn code(self) -> u8 {
        match self {
            StackOp::Hold => 0b00,
            StackOp::Push => 0b01,
            StackOp::Pop => 0b10,
        }
    }
}

/// Source of the next program counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddrSrc {
    /// PC + 1
    NextPc,
    /// The value on top of the call/return stack
    TopOfStack,
    /// The instruction's DATA field
    Data,
    /// DATA if the ALU zero flag is set, else PC + 1
    DataIfZero,
}

impl AddrSrc {
    pub const fn code(self) -> u8 {
        match self {
            AddrSrc::NextPc => 0b00,
            AddrSrc::TopOfStack => 0b01,
            AddrSrc::Data => 0b10,
            AddrSrc::DataIfZero => 0b11,
        }
    }
}

/// Source of ALU operand B.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AluSrc {
    /// The INPUT latch
    Input,
    /// The register named by DEST
    Register,
}

impl AluSrc {
    pub const fn code(self) -> u8 {
        match self {
            AluSrc::Input => 0,
            AluSrc::Register => 1,
        }
    }
}

/// Control signals for one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlWord {
    pub stack_op: StackOp,
    pub addr_src: AddrSrc,
    pub alu_op: AluOp,
    pub alu_src: AluSrc,
    /// Write the ALU result to the register named by DEST
    pub reg_write: bool,
    /// Latch the ALU result into OUTPUT
    pub out_latch: bool,
}

impl ControlWord {
    /// Width of the packed control word.
    pub const WIDTH: usize = 10;

    /// Pack as `StackOp(2) AddrSrc(2) ALUOp(3) ALUSrc(1) RegWr(1) OutLatch(1)`.
    pub const fn bits(self) -> u16 {
        (self.stack_op.code() as u16) << 8
            | (self.addr_src.code() as u16) << 6
            | (self.alu_op.code() as u16) << 3
            | (self.alu_src.code() as u16) << 2
            | (self.reg_write as u16) << 1
            | self.out_latch as u16
    }
}

impl fmt::Display for ControlWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:0width$b}", self.bits(), width = Self::WIDTH)
    }
}

/// A decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub mnemonic: Mnemonic,
    pub dest: Dest,
    pub data: Word8,
}

impl Instruction {
    pub const fn new(mnemonic: Mnemonic, dest: Dest, data: Word8) -> Self {
        Self { mnemonic, dest, data }
    }

    #[inline]
    pub const fn control_word(&self) -> ControlWord {
        self.mnemonic.control_word()
    }
}

/// Decode a 13-bit instruction word.
pub fn decode(word: InstructionWord) -> Result<Instruction, DecodeError> {
    let mnemonic = Mnemonic::from_opcode(word.opcode())?;
    let dest = Dest::from_bit(word.dest());
    Ok(Instruction { mnemonic, dest, data: word.data() })
}

/// Encode an instruction back to a 13-bit word.
pub fn encode(instr: &Instruction) -> InstructionWord {
    InstructionWord::from_fields(instr.mnemonic.opcode(), instr.dest.to_bit(), instr.data)
}

/// Errors that can occur during instruction decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid opcode: {0:04b}")]
    InvalidOpcode(u8),
}
