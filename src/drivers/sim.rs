//! In-memory digital I/O backend.
//!
//! Implements the `embedded-hal` pin and delay traits without touching
//! hardware, for host-side tests and dry runs. Clones share state, so a
//! test keeps one handle and hands the other to the code under test:
//!
//! ```
//! use embedded_hal::digital::OutputPin;
//! use waterwatch::drivers::sim::SimOutput;
//!
//! let observer = SimOutput::new();
//! let mut line = observer.clone();
//! line.set_high().unwrap();
//! assert!(observer.level());
//! ```

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, ErrorKind, ErrorType, InputPin, OutputPin};

/// Injected failure from a simulated line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimPinError;

impl digital::Error for SimPinError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

// ── Output line ───────────────────────────────────────────────

#[derive(Debug, Default)]
struct OutputState {
    high: Cell<bool>,
    fail_high: Cell<bool>,
    fail_low: Cell<bool>,
    history: RefCell<Vec<bool>>,
}

/// Simulated output line. Starts low.
#[derive(Debug, Clone, Default)]
pub struct SimOutput {
    state: Rc<OutputState>,
}

impl SimOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current driven level.
    pub fn level(&self) -> bool {
        self.state.high.get()
    }

    /// Every level successfully driven, oldest first.
    pub fn history(&self) -> Vec<bool> {
        self.state.history.borrow().clone()
    }

    /// Make subsequent `set_high` calls fail (the level is left unchanged).
    pub fn fail_set_high(&self, fail: bool) {
        self.state.fail_high.set(fail);
    }

    /// Make subsequent `set_low` calls fail (the level is left unchanged).
    pub fn fail_set_low(&self, fail: bool) {
        self.state.fail_low.set(fail);
    }

    fn drive(&self, high: bool) -> Result<(), SimPinError> {
        let fail = if high {
            self.state.fail_high.get()
        } else {
            self.state.fail_low.get()
        };
        if fail {
            return Err(SimPinError);
        }
        self.state.high.set(high);
        self.state.history.borrow_mut().push(high);
        Ok(())
    }
}

impl ErrorType for SimOutput {
    type Error = SimPinError;
}

impl OutputPin for SimOutput {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.drive(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.drive(true)
    }
}

// ── Input line ────────────────────────────────────────────────

#[derive(Debug, Default)]
struct InputState {
    level: Cell<bool>,
    script: RefCell<VecDeque<Result<bool, SimPinError>>>,
    reads: Cell<usize>,
}

/// Simulated input line.
///
/// Scripted reads are consumed first; once the script is empty every read
/// returns the steady level set with [`SimInput::set_level`].
#[derive(Debug, Clone, Default)]
pub struct SimInput {
    state: Rc<InputState>,
}

impl SimInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Input with a steady level.
    pub fn with_level(high: bool) -> Self {
        let input = Self::new();
        input.set_level(high);
        input
    }

    pub fn set_level(&self, high: bool) {
        self.state.level.set(high);
    }

    /// Queue exact read results ahead of the steady level.
    pub fn push_reads(&self, reads: &[bool]) {
        self.state
            .script
            .borrow_mut()
            .extend(reads.iter().copied().map(Ok));
    }

    /// Queue a failing read.
    pub fn push_failure(&self) {
        self.state.script.borrow_mut().push_back(Err(SimPinError));
    }

    /// Total reads attempted, including failed ones.
    pub fn reads(&self) -> usize {
        self.state.reads.get()
    }

    fn next(&self) -> Result<bool, SimPinError> {
        self.state.reads.set(self.state.reads.get() + 1);
        self.state
            .script
            .borrow_mut()
            .pop_front()
            .unwrap_or(Ok(self.state.level.get()))
    }
}

impl ErrorType for SimInput {
    type Error = SimPinError;
}

impl InputPin for SimInput {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.next()
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.next().map(|high| !high)
    }
}

// ── Delay ─────────────────────────────────────────────────────

/// Delay that returns immediately and accumulates the requested time.
#[derive(Debug, Clone, Default)]
pub struct SimDelay {
    total_ns: Rc<Cell<u64>>,
}

impl SimDelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of every delay requested so far.
    pub fn total(&self) -> core::time::Duration {
        core::time::Duration::from_nanos(self.total_ns.get())
    }
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns.set(self.total_ns.get() + u64::from(ns));
    }
}
