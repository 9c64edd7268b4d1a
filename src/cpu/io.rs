//! Shared I/O latches and program counter.
//!
//! The INPUT and OUTPUT latches and the program counter are the only state
//! visible outside the machine, so they live behind one mutex in a
//! cloneable [`IoBus`] handle. The control surface writes INPUT and reads
//! OUTPUT/PC through its own clone while the engine runs cycles.

use crate::bits::Word8;
use serde::{Serialize, Deserialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Contents of the bus at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusState {
    /// Program counter (0-63 when valid).
    pub pc: u8,
    /// INPUT latch, written only by the control surface.
    pub input: Word8,
    /// OUTPUT latch, written only by the engine.
    pub output: Word8,
}

/// Cloneable handle to the shared latches.
///
/// Every clone refers to the same state.
#[derive(Debug, Clone, Default)]
pub struct IoBus {
    inner: Arc<Mutex<BusState>>,
}

impl IoBus {
    /// Create a bus with everything zeroed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the lock.
    ///
    /// The guarded data is three plain bytes that are always consistent,
    /// so a poisoned lock is recovered rather than propagated.
    pub(crate) fn lock(&self) -> MutexGuard<'_, BusState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Read PC, INPUT and OUTPUT together.
    pub fn snapshot(&self) -> BusState {
        *self.lock()
    }

    /// Current program counter.
    pub fn pc(&self) -> u8 {
        self.lock().pc
    }

    /// Current INPUT latch.
    pub fn input(&self) -> Word8 {
        self.lock().input
    }

    /// Current OUTPUT latch.
    pub fn output(&self) -> Word8 {
        self.lock().output
    }

    /// Drive the INPUT latch.
    pub fn set_input(&self, value: Word8) {
        self.lock().input = value;
    }

    /// Clear PC and OUTPUT. INPUT is externally driven and persists.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.pc = 0;
        state.output = Word8::zero();
    }

    /// Check whether two handles share the same latches.
    pub fn same_bus(&self, other: &IoBus) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let bus = IoBus::new();
        let panel = bus.clone();
        panel.set_input(Word8::new(0b0101));
        assert_eq!(bus.input().value(), 0b0101);
        assert!(bus.same_bus(&panel));
        assert!(!bus.same_bus(&IoBus::new()));
    }

    #[test]
    fn test_reset_keeps_input() {
        let bus = IoBus::new();
        {
            let mut state = bus.lock();
            state.pc = 12;
            state.output = Word8::new(0xAA);
            state.input = Word8::new(0x0F);
        }
        bus.reset();
        assert_eq!(
            bus.snapshot(),
            BusState { pc: 0, input: Word8::new(0x0F), output: Word8::zero() }
        );
    }

    #[test]
    fn test_repeated_reads_are_stable() {
        let bus = IoBus::new();
        bus.set_input(Word8::new(3));
        bus.lock().output = Word8::new(9);
        for _ in 0..5 {
            assert_eq!(bus.input().value(), 3);
            assert_eq!(bus.output().value(), 9);
        }
    }
}
