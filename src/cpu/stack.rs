//! The 4-slot call/return stack.
//!
//! A shift register rather than a growable stack: it always holds exactly
//! four values. Pushing shifts every slot down and drops the bottom one;
//! popping shifts every slot up and fills the bottom with zero.

use crate::bits::Word8;
use serde::{Serialize, Deserialize};

/// Number of stack slots.
pub const STACK_DEPTH: usize = 4;

/// Call/return stack. Slot 0 is the top.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallStack {
    slots: [Word8; STACK_DEPTH],
}

impl CallStack {
    /// Create a stack with every slot zeroed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a stack from explicit slot values (top first).
    pub fn from_slots(slots: [Word8; STACK_DEPTH]) -> Self {
        Self { slots }
    }

    /// Push `value`; the previous bottom value is lost.
    pub fn push(&mut self, value: Word8) {
        self.slots.rotate_right(1);
        self.slots[0] = value;
    }

    /// Pop the top value; the bottom slot becomes zero.
    pub fn pop(&mut self) -> Word8 {
        let top = self.slots[0];
        self.slots.rotate_left(1);
        self.slots[STACK_DEPTH - 1] = Word8::zero();
        top
    }

    /// Leave the stack unchanged.
    #[inline]
    pub fn hold(&mut self) {}

    /// Read the top of stack without modifying anything.
    #[inline]
    pub fn top(&self) -> Word8 {
        self.slots[0]
    }

    /// All slots, top first.
    #[inline]
    pub fn slots(&self) -> &[Word8; STACK_DEPTH] {
        &self.slots
    }

    /// Zero every slot.
    pub fn reset(&mut self) {
        self.slots = [Word8::zero(); STACK_DEPTH];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn values(stack: &CallStack) -> Vec<u8> {
        stack.slots().iter().map(|w| w.value()).collect()
    }

    #[test]
    fn test_push_drops_oldest() {
        let mut stack = CallStack::new();
        for v in 1..=5 {
            stack.push(Word8::new(v));
        }
        assert_eq!(values(&stack), vec![5, 4, 3, 2]);
    }

    #[test]
    fn test_pop_shifts_up_and_zero_fills() {
        let mut stack = CallStack::from_slots([10, 20, 30, 40].map(Word8::new));

        assert_eq!(stack.pop().value(), 10);
        assert_eq!(values(&stack), vec![20, 30, 40, 0]);
        assert_eq!(stack.pop().value(), 20);
        assert_eq!(values(&stack), vec![30, 40, 0, 0]);
        assert_eq!(stack.pop().value(), 30);
        assert_eq!(stack.pop().value(), 40);
        assert_eq!(values(&stack), vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_top_and_hold_are_pure() {
        let mut stack = CallStack::from_slots([7, 0, 0, 1].map(Word8::new));
        assert_eq!(stack.top().value(), 7);
        stack.hold();
        assert_eq!(values(&stack), vec![7, 0, 0, 1]);
    }

    proptest! {
        #[test]
        fn prop_push_then_pop_restores(slots: [u8; 4], v: u8) {
            let mut stack = CallStack::from_slots(slots.map(Word8::new));
            stack.push(Word8::new(v));
            prop_assert_eq!(stack.pop().value(), v);
            // The dropped bottom value comes back as zero
            let mut expected = slots;
            expected[3] = 0;
            prop_assert_eq!(values(&stack), expected.to_vec());
        }

        #[test]
        fn prop_four_pushes_pop_in_reverse(vals: [u8; 4]) {
            let mut stack = CallStack::new();
            for v in vals {
                stack.push(Word8::new(v));
            }
            for v in vals.iter().rev() {
                prop_assert_eq!(stack.pop().value(), *v);
            }
            prop_assert_eq!(values(&stack), vec![0, 0, 0, 0]);
        }
    }
}
