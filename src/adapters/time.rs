//! Wall-clock time adapter.
//!
//! - [`SystemClock`] reads the host's local time through `chrono`.
//! - [`ManualClock`] is set by hand, for host-side tests and replays.

use std::cell::Cell;

use chrono::{Local, NaiveDateTime, TimeDelta};

use crate::app::ports::Clock;

/// Local time of the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Cell<NaiveDateTime>,
}

impl ManualClock {
    pub fn new(start: NaiveDateTime) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    pub fn set(&self, at: NaiveDateTime) {
        self.now.set(at);
    }

    pub fn advance(&self, by: TimeDelta) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        self.now.get()
    }
}
