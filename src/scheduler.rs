//! Time-of-day actuation window.
//!
//! The smart plug is switched on at one configured minute of the day, and
//! only if the probe currently reads wet. The scheduler itself is stateless:
//! it answers "does this instant match?" and "how long may the loop sleep
//! without stepping over the window?". The monitor remembers which minute
//! it last actuated in so the plug is commanded at most once per window.
//!
//! ```text
//!   interval = 120 s, trigger = 07:00
//!
//!   06:57:00 ──120s──▶ 06:59:00 ──61s──▶ 07:00:01 ──120s──▶ 07:02:01
//!                               (shortened)   ▲ window hit
//! ```

use core::fmt;
use core::str::FromStr;
use core::time::Duration;

use chrono::{NaiveDateTime, TimeDelta, Timelike};
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// How far into the trigger minute a shortened sleep lands.
const WINDOW_ENTRY_SLACK: TimeDelta = TimeDelta::seconds(1);

// ═══════════════════════════════════════════════════════════════
//  Trigger time
// ═══════════════════════════════════════════════════════════════

/// A minute of the day, `HH:MM` in local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TriggerTime {
    hour: u8,
    minute: u8,
}

impl TriggerTime {
    /// `None` unless `hour < 24` and `minute < 60`.
    pub const fn new(hour: u8, minute: u8) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self { hour, minute })
        } else {
            None
        }
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    /// Whether `at` falls inside this minute (seconds are ignored).
    pub fn matches(&self, at: &NaiveDateTime) -> bool {
        at.hour() == u32::from(self.hour) && at.minute() == u32::from(self.minute)
    }

    /// Start of the first window strictly after `now`.
    fn next_start_after(&self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        let today = now
            .date()
            .and_hms_opt(u32::from(self.hour), u32::from(self.minute), 0)?;
        if today > now {
            Some(today)
        } else {
            today.checked_add_signed(TimeDelta::days(1))
        }
    }
}

impl fmt::Display for TriggerTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Rejected `HH:MM` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTriggerError(pub String);

impl fmt::Display for ParseTriggerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected HH:MM, got {:?}", self.0)
    }
}

impl std::error::Error for ParseTriggerError {}

impl FromStr for TriggerTime {
    type Err = ParseTriggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseTriggerError(s.to_string());
        let (h, m) = s.trim().split_once(':').ok_or_else(err)?;
        let hour = h.parse().map_err(|_| err())?;
        let minute = m.parse().map_err(|_| err())?;
        Self::new(hour, minute).ok_or_else(err)
    }
}

impl TryFrom<String> for TriggerTime {
    type Error = ParseTriggerError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<TriggerTime> for String {
    fn from(t: TriggerTime) -> Self {
        t.to_string()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler
// ═══════════════════════════════════════════════════════════════

/// Decides when the plug may be switched on.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActuationScheduler {
    trigger: Option<TriggerTime>,
}

impl ActuationScheduler {
    pub fn new(trigger: Option<TriggerTime>) -> Self {
        if let Some(t) = trigger {
            info!("Scheduler: actuation window at {t} when wet");
        }
        Self { trigger }
    }

    /// True iff `now` is inside the trigger minute and the probe is wet.
    pub fn should_actuate(&self, now: &NaiveDateTime, currently_wet: bool) -> bool {
        currently_wet && self.trigger.is_some_and(|t| t.matches(now))
    }

    /// Sleep length after an iteration at `now`.
    ///
    /// Normally `interval`. Shortened when sleeping the full interval would
    /// carry the loop past the end of the next trigger minute, so the loop
    /// wakes one second into that minute instead.
    pub fn next_wake(&self, now: NaiveDateTime, interval: Duration) -> Duration {
        let Some(trigger) = self.trigger else {
            return interval;
        };
        let (Ok(step), Some(start)) = (
            TimeDelta::from_std(interval),
            trigger.next_start_after(now),
        ) else {
            return interval;
        };

        let window_end = start + TimeDelta::minutes(1);
        // Past the end of the calendar there is nothing to aim at.
        if now
            .checked_add_signed(step)
            .is_none_or(|wake| wake < window_end)
        {
            return interval;
        }

        match (start + WINDOW_ENTRY_SLACK - now).to_std() {
            Ok(shortened) if shortened < interval => {
                debug!("Scheduler: shortening sleep to {shortened:?} to hit {trigger}");
                shortened
            }
            _ => interval,
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
