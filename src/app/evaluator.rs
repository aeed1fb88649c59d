//! Transition and notification policy.
//!
//! [`StateEvaluator::evaluate`] is a pure function of the new reading, the
//! remembered [`DetectorState`] and the current time. The monitor commits
//! the outcome back into the state afterwards.
//!
//! ```text
//!   reading ─┬─ first ever? ──────────────▶ report
//!            ├─ differs from last_state? ─▶ report (ignores cooldown)
//!            └─ cooldown elapsed? ────────▶ report
//! ```

use chrono::{NaiveDateTime, TimeDelta};

/// What the monitor remembers between iterations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectorState {
    /// Last reported state (`true` = wet).
    pub last_state: bool,
    /// Time of the last reported reading. `None` until the first report.
    pub last_reading_time: Option<NaiveDateTime>,
    /// Time of the last successfully delivered notification.
    pub last_notification_time: Option<NaiveDateTime>,
}

impl DetectorState {
    /// Record a reported reading. `last_reading_time` never moves backwards,
    /// even if the wall clock does.
    pub fn commit_reading(&mut self, wet: bool, at: NaiveDateTime) {
        self.last_state = wet;
        self.last_reading_time = Some(match self.last_reading_time {
            Some(prev) if prev > at => prev,
            _ => at,
        });
    }

    /// Record a delivered notification.
    pub fn record_notification(&mut self, at: NaiveDateTime) {
        self.last_notification_time = Some(at);
    }
}

/// Outcome of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    /// No reading has been reported before.
    pub first_reading: bool,
    /// The reading differs from the last reported state.
    pub changed: bool,
    /// A notification is due (transition, never notified, or cooldown over).
    pub should_notify: bool,
    /// Time since the last reported reading; `None` on the first reading.
    pub elapsed: Option<TimeDelta>,
}

impl Evaluation {
    /// Whether this reading produces an event and a notification.
    pub fn should_report(&self) -> bool {
        self.first_reading || self.changed || self.should_notify
    }
}

/// Applies the notification cooldown.
#[derive(Debug, Clone, Copy)]
pub struct StateEvaluator {
    cooldown: TimeDelta,
}

impl StateEvaluator {
    pub fn new(cooldown: TimeDelta) -> Self {
        Self { cooldown }
    }

    pub fn evaluate(&self, current: bool, state: &DetectorState, now: NaiveDateTime) -> Evaluation {
        let Some(last_reading) = state.last_reading_time else {
            return Evaluation {
                first_reading: true,
                changed: true,
                should_notify: true,
                elapsed: None,
            };
        };

        let changed = current != state.last_state;
        let cooldown_over = state
            .last_notification_time
            .is_none_or(|sent| now - sent > self.cooldown);

        Evaluation {
            first_reading: false,
            changed,
            should_notify: changed || cooldown_over,
            elapsed: Some(now - last_reading),
        }
    }
}
