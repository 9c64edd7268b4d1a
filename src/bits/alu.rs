//! Bit-vector arithmetic-logic unit.
//!
//! Every data operation of the machine goes through [`evaluate`], which
//! takes operand A (always the instruction's DATA field) and operand B
//! (a register or the INPUT latch) and produces an 8-bit result plus the
//! zero flag used by conditional branches.
//!
//! The zero flag of ADD and SUB is computed on the *untruncated* sum, so
//! an overflowing sum that wraps to 0 does not set it.

use crate::bits::Word8;
use serde::{Serialize, Deserialize};
use std::fmt;
use thiserror::Error;

/// ALU operation selected by the control word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AluOp {
    /// result = A
    PassA,
    /// result = B
    PassB,
    /// result = A + B (mod 256)
    Add,
    /// result = A + twos_complement(B) (mod 256)
    Sub,
    /// positional A AND B
    And,
    /// positional A XOR B
    Xor,
    /// result = 0, zero flag always set
    Zero,
}

impl AluOp {
    /// All operations, in control-word code order.
    pub const ALL: [AluOp; 7] = [
        AluOp::PassA,
        AluOp::PassB,
        AluOp::Add,
        AluOp::Sub,
        AluOp::And,
        AluOp::Xor,
        AluOp::Zero,
    ];

    /// The 3-bit field this operation occupies in the control word.
    pub const fn code(self) -> u8 {
        match self {
            AluOp::PassA => 0b000,
            AluOp::PassB => 0b001,
            AluOp::Add => 0b010,
            AluOp::Sub => 0b011,
            AluOp::And => 0b100,
            AluOp::Xor => 0b110,
            AluOp::Zero => 0b111,
        }
    }

    /// Look up an operation by its control-word code. `0b101` is unused.
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.code() == code)
    }
}

impl fmt::Display for AluOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AluOp::PassA => "A",
            AluOp::PassB => "B",
            AluOp::Add => "A+B",
            AluOp::Sub => "A-B",
            AluOp::And => "A&B",
            AluOp::Xor => "A^B",
            AluOp::Zero => "0",
        };
        f.write_str(name)
    }
}

/// Output of one ALU evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AluResult {
    pub value: Word8,
    pub zero: bool,
}

impl AluResult {
    fn of(value: Word8) -> Self {
        Self { value, zero: value.is_zero() }
    }
}

/// Evaluate `op` on operands A and B.
pub fn evaluate(op: AluOp, a: Word8, b: Word8) -> Result<AluResult, AluError> {
    let result = match op {
        AluOp::PassA => AluResult::of(a),
        AluOp::PassB => AluResult::of(b),
        AluOp::Add => add(a, b),
        AluOp::Sub => subtract(a, b),
        AluOp::And => AluResult::of(word_from_bits(&bitwise_and(&a.bits(), &b.bits())?)),
        AluOp::Xor => AluResult::of(word_from_bits(&bitwise_xor(&a.bits(), &b.bits())?)),
        AluOp::Zero => AluResult { value: Word8::zero(), zero: true },
    };
    Ok(result)
}

/// Add two words modulo 256.
///
/// `zero` is true iff the untruncated sum is 0, i.e. only for 0 + 0.
pub fn add(a: Word8, b: Word8) -> AluResult {
    let sum = a.value() as u16 + b.value() as u16;
    AluResult {
        value: Word8::new(sum as u8),
        zero: sum == 0,
    }
}

/// Two's complement of a word (`!b + 1`, truncated to 8 bits).
#[inline]
pub fn twos_complement(b: Word8) -> Word8 {
    add(b.not(), Word8::new(1)).value
}

/// Subtract `b` from `a` by adding the two's complement of `b`.
///
/// The zero flag follows the ADD rule on the pre-truncation sum, so it is
/// only set for `0 - 0`.
#[inline]
pub fn subtract(a: Word8, b: Word8) -> AluResult {
    add(a, twos_complement(b))
}

/// Positional AND of two equal-width bit strings.
pub fn bitwise_and(a: &[bool], b: &[bool]) -> Result<Vec<bool>, AluError> {
    positional(a, b, |x, y| x & y)
}

/// Positional XOR of two equal-width bit strings.
pub fn bitwise_xor(a: &[bool], b: &[bool]) -> Result<Vec<bool>, AluError> {
    positional(a, b, |x, y| x ^ y)
}

fn positional(a: &[bool], b: &[bool], f: impl Fn(bool, bool) -> bool) -> Result<Vec<bool>, AluError> {
    if a.len() != b.len() {
        return Err(AluError::OperandWidthMismatch { left: a.len(), right: b.len() });
    }
    Ok(a.iter().zip(b).map(|(&x, &y)| f(x, y)).collect())
}

/// Pack an MSB-first bit string into a word, keeping the low 8 bits.
fn word_from_bits(bits: &[bool]) -> Word8 {
    let value = bits.iter().fold(0u8, |acc, &bit| (acc << 1) | bit as u8);
    Word8::new(value)
}

/// Errors raised by the ALU.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AluError {
    #[error("bitwise operands differ in width: {left} vs {right} bits")]
    OperandWidthMismatch { left: usize, right: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn w(v: u8) -> Word8 {
        Word8::new(v)
    }

    #[test]
    fn test_add_overflow_does_not_set_zero() {
        let r = evaluate(AluOp::Add, w(0x80), w(0x80)).unwrap();
        assert_eq!(r.value, w(0x00));
        assert!(!r.zero);

        let r = evaluate(AluOp::Add, w(0), w(0)).unwrap();
        assert!(r.zero);
    }

    #[test]
    fn test_add_simple() {
        let r = add(w(5), w(3));
        assert_eq!(r.value, w(8));
        assert!(!r.zero);
    }

    #[test]
    fn test_twos_complement() {
        assert_eq!(twos_complement(w(1)), w(0xFF));
        assert_eq!(twos_complement(w(0)), w(0));
        assert_eq!(twos_complement(w(0x80)), w(0x80));
    }

    #[test]
    fn test_subtract() {
        let r = evaluate(AluOp::Sub, w(10), w(3)).unwrap();
        assert_eq!(r.value, w(7));

        // 5 - 5 wraps to 0 but the untruncated sum is 256
        let r = evaluate(AluOp::Sub, w(5), w(5)).unwrap();
        assert_eq!(r.value, w(0));
        assert!(!r.zero);

        let r = evaluate(AluOp::Sub, w(0), w(0)).unwrap();
        assert!(r.zero);

        let r = evaluate(AluOp::Sub, w(3), w(10)).unwrap();
        assert_eq!(r.value, w(249));
    }

    #[test]
    fn test_pass_operands() {
        let r = evaluate(AluOp::PassA, w(7), w(0)).unwrap();
        assert_eq!(r, AluResult { value: w(7), zero: false });

        let r = evaluate(AluOp::PassB, w(7), w(0)).unwrap();
        assert_eq!(r, AluResult { value: w(0), zero: true });
    }

    #[test]
    fn test_and_is_positional() {
        let r = evaluate(AluOp::And, w(0b1100_1010), w(0b1010_0110)).unwrap();
        assert_eq!(r.value, w(0b1000_0010));
        assert!(!r.zero);

        let r = evaluate(AluOp::And, w(0b1111_0000), w(0b0000_1111)).unwrap();
        assert!(r.zero);
    }

    #[test]
    fn test_xor() {
        let r = evaluate(AluOp::Xor, w(0b1100_1010), w(0b1010_0110)).unwrap();
        assert_eq!(r.value, w(0b0110_1100));

        let r = evaluate(AluOp::Xor, w(0x5A), w(0x5A)).unwrap();
        assert!(r.zero);
    }

    #[test]
    fn test_zero_op_ignores_inputs() {
        let r = evaluate(AluOp::Zero, w(0xFF), w(0xFF)).unwrap();
        assert_eq!(r, AluResult { value: w(0), zero: true });
    }

    #[test]
    fn test_width_mismatch() {
        let err = bitwise_xor(&[true, false], &[true]).unwrap_err();
        assert_eq!(err, AluError::OperandWidthMismatch { left: 2, right: 1 });
        assert!(bitwise_and(&[true; 8], &[false; 7]).is_err());
    }

    #[test]
    fn test_code_lookup() {
        for op in AluOp::ALL {
            assert_eq!(AluOp::from_code(op.code()), Some(op));
        }
        assert_eq!(AluOp::from_code(0b101), None);
    }

    proptest! {
        #[test]
        fn prop_add_truncates(a: u8, b: u8) {
            let r = add(w(a), w(b));
            prop_assert_eq!(r.value.value(), a.wrapping_add(b));
            prop_assert_eq!(r.zero, a == 0 && b == 0);
        }

        #[test]
        fn prop_sub_is_add_of_complement(a: u8, b: u8) {
            let sub = evaluate(AluOp::Sub, w(a), w(b)).unwrap();
            let via_add = evaluate(AluOp::Add, w(a), twos_complement(w(b))).unwrap();
            prop_assert_eq!(sub, via_add);
            prop_assert_eq!(sub.value.value(), a.wrapping_sub(b));
        }

        #[test]
        fn prop_xor_involutive(a: u8, b: u8) {
            let once = evaluate(AluOp::Xor, w(a), w(b)).unwrap().value;
            let twice = evaluate(AluOp::Xor, once, w(b)).unwrap().value;
            prop_assert_eq!(twice, w(a));
        }

        #[test]
        fn prop_and_matches_native(a: u8, b: u8) {
            let r = evaluate(AluOp::And, w(a), w(b)).unwrap();
            prop_assert_eq!(r.value.value(), a & b);
            prop_assert_eq!(r.zero, a & b == 0);
        }
    }
}
