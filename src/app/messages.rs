//! Notification texts.
//!
//! Kept in one place so the wording stays consistent between the loop,
//! the shutdown path and the tests.

use chrono::{NaiveDateTime, TimeDelta};

use super::ports::WaterStatus;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn started() -> String {
    "🔄 Water detection system initialized and monitoring".to_string()
}

pub fn status_update(
    location: &str,
    status: WaterStatus,
    at: NaiveDateTime,
    elapsed: TimeDelta,
) -> String {
    let emoji = status_emoji(status);
    format!(
        "{emoji} Water Sensor Update {emoji}\n\
         Location: {location}\n\
         Status: {status}\n\
         Time: {}\n\
         Duration: {}",
        at.format(TIMESTAMP_FORMAT),
        format_elapsed(elapsed),
    )
}

pub fn actuated() -> String {
    let emoji = status_emoji(WaterStatus::Wet);
    format!("{emoji} Water Sensor Update {emoji}\nWater detected.\nTurning bird bath ON")
}

pub fn actuation_failed(err: &dyn core::fmt::Display) -> String {
    format!("⚠️ Failed to turn bird bath ON: {err}")
}

pub fn sensor_error(err: &dyn core::fmt::Display) -> String {
    format!("⚠️ Error checking water sensor: {err}")
}

pub fn stopped_by_user() -> String {
    "🛑 Water monitoring stopped by user".to_string()
}

pub fn monitoring_error(err: &dyn core::fmt::Display) -> String {
    format!("🚨 Monitoring error: {err}")
}

/// `action_taken` text of a persisted event.
pub fn time_since_last_reading(elapsed: TimeDelta) -> String {
    format!("Time since last reading: {}", format_elapsed(elapsed))
}

fn status_emoji(status: WaterStatus) -> &'static str {
    match status {
        WaterStatus::Wet => "💧",
        WaterStatus::Dry => "🔹",
    }
}

/// `H:MM:SS`, with a `N day(s), ` prefix past 24 hours. Sub-second parts
/// are dropped.
pub fn format_elapsed(elapsed: TimeDelta) -> String {
    let sign = if elapsed < TimeDelta::zero() { "-" } else { "" };
    let total = elapsed.num_seconds().unsigned_abs();
    let days = total / 86_400;
    let rem = total % 86_400;
    let hms = format!("{}:{:02}:{:02}", rem / 3600, (rem % 3600) / 60, rem % 60);
    match days {
        0 => format!("{sign}{hms}"),
        1 => format!("{sign}1 day, {hms}"),
        n => format!("{sign}{n} days, {hms}"),
    }
}
