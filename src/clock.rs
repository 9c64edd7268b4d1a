//! Clock scheduler.
//!
//! A machine is driven either by hand, one cycle per [`Clock::step`], or by
//! a background worker thread that runs one cycle per clock period. The
//! [`ClockMode`] selects which trigger is live; the worker reads it before
//! every attempt, so switching back to manual takes effect before the next
//! cycle.
//!
//! The worker is a best-effort software timer: consecutive cycles are never
//! closer together than one period, but may be further apart. Cycles always
//! run with the machine mutex held, so two cycles never overlap.

use crate::cpu::{CpuError, CycleReport, Mcu};
use serde::{Serialize, Deserialize};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;

/// A machine shared between the clock worker and the foreground.
pub type SharedMcu = Arc<Mutex<Mcu>>;

/// Wrap a machine for use with a [`Clock`].
pub fn share(mcu: Mcu) -> SharedMcu {
    Arc::new(Mutex::new(mcu))
}

/// Lock a shared machine, recovering from poisoning.
pub fn lock_mcu(machine: &SharedMcu) -> MutexGuard<'_, Mcu> {
    machine.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Which trigger drives the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockMode {
    /// Cycles run only on [`Clock::step`].
    #[default]
    Manual,
    /// The worker runs one cycle per period.
    Automatic,
}

/// A cycle that failed, with the address it was fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    pub pc: u8,
    pub error: CpuError,
}

#[derive(Debug, Default)]
struct Control {
    mode: ClockMode,
    cancelled: bool,
    fault: Option<Fault>,
}

type ControlCell = Arc<(Mutex<Control>, Condvar)>;

fn lock_control(cell: &ControlCell) -> MutexGuard<'_, Control> {
    cell.0.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle to a running clock worker.
///
/// Dropping the clock stops the worker.
pub struct Clock {
    machine: SharedMcu,
    control: ControlCell,
    period: Duration,
    worker: Option<JoinHandle<()>>,
}

impl Clock {
    /// Start a clock worker for `machine` at `hz` cycles per second.
    ///
    /// The clock starts in manual mode.
    pub fn spawn(machine: SharedMcu, hz: u32) -> Result<Self, ClockError> {
        if hz == 0 {
            return Err(ClockError::InvalidFrequency(hz));
        }
        let period = Duration::from_nanos(1_000_000_000 / hz as u64);
        let control: ControlCell = Arc::new((Mutex::new(Control::default()), Condvar::new()));

        let worker = {
            let machine = Arc::clone(&machine);
            let control = Arc::clone(&control);
            thread::Builder::new()
                .name("mcu-clock".into())
                .spawn(move || run_worker(machine, control, period))
                .map_err(|e| ClockError::Spawn(e.to_string()))?
        };

        log::debug!("clock started at {} Hz ({:?} period)", hz, period);

        Ok(Self {
            machine,
            control,
            period,
            worker: Some(worker),
        })
    }

    /// The machine this clock drives.
    pub fn machine(&self) -> &SharedMcu {
        &self.machine
    }

    /// Configured clock period.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Current mode.
    pub fn mode(&self) -> ClockMode {
        lock_control(&self.control).mode
    }

    /// Switch between manual and automatic clocking.
    pub fn set_mode(&self, mode: ClockMode) {
        let mut control = lock_control(&self.control);
        if control.mode != mode {
            log::info!("clock mode: {:?}", mode);
        }
        control.mode = mode;
        self.control.1.notify_all();
    }

    /// Run one cycle by hand.
    ///
    /// Rejected while the clock is automatic. A failing cycle is also
    /// recorded as the clock's fault.
    pub fn step(&self) -> Result<CycleReport, ClockError> {
        if self.mode() == ClockMode::Automatic {
            return Err(ClockError::AutomaticModeActive);
        }

        let mut mcu = lock_mcu(&self.machine);
        let pc = mcu.pc();
        mcu.step().map_err(|error| {
            lock_control(&self.control).fault = Some(Fault { pc, error: error.clone() });
            ClockError::Cycle { pc, source: error }
        })
    }

    /// The most recent failing cycle, if any.
    pub fn fault(&self) -> Option<Fault> {
        lock_control(&self.control).fault.clone()
    }

    /// Forget the recorded fault (e.g. after a reset).
    pub fn clear_fault(&self) {
        lock_control(&self.control).fault = None;
    }

    /// Stop the worker and wait for it to exit.
    pub fn stop(&mut self) {
        {
            let mut control = lock_control(&self.control);
            control.cancelled = true;
            self.control.1.notify_all();
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("clock worker panicked");
            }
        }
    }
}

impl Drop for Clock {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Clock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Clock")
            .field("period", &self.period)
            .field("mode", &self.mode())
            .finish()
    }
}

fn run_worker(machine: SharedMcu, control: ControlCell, period: Duration) {
    let (_, wakeup) = &*control;
    let mut last_cycle = Instant::now();

    loop {
        let mut guard = lock_control(&control);
        if guard.cancelled {
            break;
        }

        if guard.mode == ClockMode::Manual {
            // Park until the mode changes or the clock is stopped
            while guard.mode == ClockMode::Manual && !guard.cancelled {
                guard = wakeup.wait(guard).unwrap_or_else(PoisonError::into_inner);
            }
            last_cycle = Instant::now();
            continue;
        }

        let elapsed = last_cycle.elapsed();
        if elapsed < period {
            let _ = wakeup
                .wait_timeout(guard, period - elapsed)
                .unwrap_or_else(PoisonError::into_inner);
            continue;
        }
        drop(guard);

        let outcome = {
            let mut mcu = lock_mcu(&machine);
            let pc = mcu.pc();
            mcu.step().map_err(|error| Fault { pc, error })
        };
        last_cycle = Instant::now();

        if let Err(fault) = outcome {
            log::error!("cycle at pc={} failed: {}; clock halted", fault.pc, fault.error);
            let mut guard = lock_control(&control);
            guard.fault = Some(fault);
            guard.mode = ClockMode::Manual;
        }
    }

    log::debug!("clock worker stopped");
}

/// Errors reported by the clock.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClockError {
    #[error("invalid clock frequency: {0} Hz")]
    InvalidFrequency(u32),

    #[error("manual step rejected: clock is in automatic mode")]
    AutomaticModeActive,

    #[error("cycle at pc={pc} failed: {source}")]
    Cycle { pc: u8, source: CpuError },

    #[error("failed to start clock thread: {0}")]
    Spawn(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bits::{InstructionWord, Word8};
    use crate::cpu::decode::{encode, Instruction, Mnemonic};
    use crate::cpu::Dest;

    fn looping_machine() -> SharedMcu {
        let mut mcu = Mcu::new();
        // 0: DOUT 1; 1: B 0
        mcu.load_program(&[
            encode(&Instruction::new(Mnemonic::Dout, Dest::Reg0, Word8::new(1))),
            encode(&Instruction::new(Mnemonic::B, Dest::Reg0, Word8::new(0))),
        ])
        .unwrap();
        share(mcu)
    }

    fn cycles(clock: &Clock) -> u64 {
        lock_mcu(clock.machine()).cycles
    }

    #[test]
    fn test_zero_frequency_rejected() {
        let err = Clock::spawn(looping_machine(), 0).unwrap_err();
        assert_eq!(err, ClockError::InvalidFrequency(0));
    }

    #[test]
    fn test_manual_step() {
        let clock = Clock::spawn(looping_machine(), 1000).unwrap();
        assert_eq!(clock.mode(), ClockMode::Manual);

        let report = clock.step().unwrap();
        assert_eq!(report.next_pc, 1);
        clock.step().unwrap();
        assert_eq!(lock_mcu(clock.machine()).pc(), 0);
        assert_eq!(cycles(&clock), 2);
    }

    #[test]
    fn test_manual_mode_runs_nothing_in_background() {
        let clock = Clock::spawn(looping_machine(), 1000).unwrap();
        thread::sleep(Duration::from_millis(30));
        assert_eq!(cycles(&clock), 0);
    }

    #[test]
    fn test_automatic_runs_and_pauses() {
        let clock = Clock::spawn(looping_machine(), 1000).unwrap();
        clock.set_mode(ClockMode::Automatic);
        assert_eq!(clock.step().unwrap_err(), ClockError::AutomaticModeActive);

        let deadline = Instant::now() + Duration::from_secs(2);
        while cycles(&clock) < 5 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        clock.set_mode(ClockMode::Manual);
        assert!(cycles(&clock) >= 5);

        // Switching to manual is observed before the next cycle
        thread::sleep(Duration::from_millis(5));
        let paused_at = cycles(&clock);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(cycles(&clock), paused_at);
    }

    #[test]
    fn test_period_is_a_lower_bound() {
        let clock = Clock::spawn(looping_machine(), 100).unwrap();
        let start = Instant::now();
        clock.set_mode(ClockMode::Automatic);
        thread::sleep(Duration::from_millis(60));
        clock.set_mode(ClockMode::Manual);
        let elapsed = start.elapsed();

        let max = elapsed.as_nanos() / clock.period().as_nanos() + 1;
        assert!((cycles(&clock) as u128) <= max);
    }

    #[test]
    fn test_fault_halts_automatic_clock() {
        let mut mcu = Mcu::new();
        mcu.load_program(&[InstructionWord::from_fields(0b1111, false, Word8::zero())])
            .unwrap();
        let clock = Clock::spawn(share(mcu), 1000).unwrap();
        clock.set_mode(ClockMode::Automatic);

        let deadline = Instant::now() + Duration::from_secs(2);
        while clock.fault().is_none() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }

        let fault = clock.fault().unwrap();
        assert_eq!(fault.pc, 0);
        assert!(matches!(fault.error, CpuError::Decode(_)));
        assert_eq!(clock.mode(), ClockMode::Manual);
        assert_eq!(cycles(&clock), 0);

        clock.clear_fault();
        assert!(clock.fault().is_none());
    }

    #[test]
    fn test_manual_fault_is_recorded() {
        let mut mcu = Mcu::new();
        mcu.load_program(&[InstructionWord::from_fields(0b1101, true, Word8::zero())])
            .unwrap();
        let clock = Clock::spawn(share(mcu), 10).unwrap();

        let err = clock.step().unwrap_err();
        assert!(matches!(err, ClockError::Cycle { pc: 0, .. }));
        assert_eq!(clock.fault().map(|f| f.pc), Some(0));
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut clock = Clock::spawn(looping_machine(), 1000).unwrap();
        clock.set_mode(ClockMode::Automatic);
        clock.stop();
        let after_stop = cycles(&clock);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(cycles(&clock), after_stop);
        clock.stop();
    }
}
