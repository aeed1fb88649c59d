//! Monitor configuration.
//!
//! All tunable parameters for the water monitor. Values come from the
//! process environment (a `.env` file is loaded first by the binary) and
//! are validated before the monitor starts.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono::TimeDelta;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::pins::{GPIO_CHIP, SENSOR_GPIO, SENSOR_POWER_GPIO};
use crate::scheduler::TriggerTime;

// ── Environment keys ──────────────────────────────────────────

pub const KEY_SENSOR_PIN: &str = "WATER_SENSOR_PIN";
pub const KEY_POWER_PIN: &str = "WATER_POWER_PIN";
pub const KEY_INTERVAL: &str = "WATER_CHECK_INTERVAL_SECS";
pub const KEY_COOLDOWN: &str = "WATER_NOTIFY_COOLDOWN_SECS";
pub const KEY_DEBUG: &str = "WATER_DEBUG";
pub const KEY_ACTUATE_AT: &str = "WATER_ACTUATE_AT";
pub const KEY_LOCATION: &str = "WATER_LOCATION";
pub const KEY_EVENT_LOG: &str = "WATER_EVENT_LOG";
pub const KEY_LOG_FILE: &str = "WATER_LOG_FILE";
pub const KEY_REMOTE_TIMEOUT: &str = "WATER_REMOTE_TIMEOUT_SECS";
pub const KEY_GPIO_CHIP: &str = "WATER_GPIO_CHIP";
pub const KEY_LEVITON_USER: &str = "SECRET_LEVITON_USER";
pub const KEY_LEVITON_PASS: &str = "SECRET_LEVITON_PASS";
pub const KEY_LEVITON_RESIDENCE: &str = "LEVITON_RESIDENCE_ID";
pub const KEY_LEVITON_DEVICE: &str = "LEVITON_DEVICE_ID";
pub const KEY_TELEGRAM_TOKEN: &str = "SECRET_TELEGRAM_TOKEN";
pub const KEY_TELEGRAM_CHAT: &str = "SECRET_TELEGRAM_CHAT";

/// Trigger used when controller credentials exist and no time is set.
pub const DEFAULT_ACTUATE_AT: TriggerTime = match TriggerTime::new(7, 0) {
    Some(t) => t,
    None => panic!("07:00 is a valid time of day"),
};

/// Longest accepted loop interval. Keeps the wake-up arithmetic in range
/// and the daily actuation window reachable.
pub const MAX_CHECK_INTERVAL_SECS: u64 = 24 * 60 * 60;

pub const DEFAULT_RESIDENCE_ID: &str = "903353";
pub const DEFAULT_DEVICE_ID: &str = "1920823";

// ── Settings ──────────────────────────────────────────────────

/// Leviton Decora cloud account and target plug.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LevitonSettings {
    pub email: String,
    pub password: String,
    pub residence_id: String,
    pub device_id: String,
}

impl core::fmt::Debug for LevitonSettings {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LevitonSettings")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("residence_id", &self.residence_id)
            .field("device_id", &self.device_id)
            .finish()
    }
}

/// Telegram bot credentials.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TelegramSettings {
    pub token: String,
    pub chat_id: String,
}

impl core::fmt::Debug for TelegramSettings {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TelegramSettings")
            .field("token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

/// Core monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MonitorConfig {
    // --- Hardware ---
    /// BCM line the probe signal is read from (offset on `gpio_chip`)
    pub sensor_pin: u32,
    /// BCM line that powers the probe (offset on `gpio_chip`)
    pub power_pin: u32,
    /// GPIO character device the lines belong to
    pub gpio_chip: PathBuf,

    // --- Timing ---
    /// Seconds between loop iterations
    pub check_interval_secs: u64,
    /// Minimum seconds between notifications for an unchanged state
    pub notify_cooldown_secs: u64,
    /// Timeout for every HTTP call
    pub remote_timeout_secs: u64,
    /// Minute of the day the plug is switched on when wet
    pub actuate_at: Option<TriggerTime>,

    // --- Output ---
    /// Verbose logging
    pub debug: bool,
    /// Location label in events and messages (host name when unset)
    pub location: Option<String>,
    /// JSON Lines event history
    pub event_log: PathBuf,
    /// Durable log file
    pub log_file: PathBuf,

    // --- Remote services ---
    pub leviton: Option<LevitonSettings>,
    pub telegram: Option<TelegramSettings>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            // Hardware
            sensor_pin: SENSOR_GPIO,
            power_pin: SENSOR_POWER_GPIO,
            gpio_chip: PathBuf::from(GPIO_CHIP),

            // Timing
            check_interval_secs: 120,
            notify_cooldown_secs: 6 * 60 * 60,
            remote_timeout_secs: 10,
            // No controller by default, so nothing to actuate.
            actuate_at: None,

            // Output
            debug: false,
            location: None,
            event_log: PathBuf::from("water_events.jsonl"),
            log_file: PathBuf::from("water_detection.log"),

            leviton: None,
            telegram: None,
        }
    }
}

impl MonitorConfig {
    /// Load from the process environment and validate.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup and validate.
    ///
    /// Unset and empty keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut c = Self::default();

        if let Some(v) = parse_key(&get, KEY_SENSOR_PIN)? {
            c.sensor_pin = v;
        }
        if let Some(v) = parse_key(&get, KEY_POWER_PIN)? {
            c.power_pin = v;
        }
        if let Some(v) = get(KEY_GPIO_CHIP) {
            c.gpio_chip = PathBuf::from(v);
        }
        if let Some(v) = parse_key(&get, KEY_INTERVAL)? {
            c.check_interval_secs = v;
        }
        if let Some(v) = parse_key(&get, KEY_COOLDOWN)? {
            c.notify_cooldown_secs = v;
        }
        if let Some(v) = parse_key(&get, KEY_REMOTE_TIMEOUT)? {
            c.remote_timeout_secs = v;
        }
        if let Some(v) = get(KEY_DEBUG) {
            c.debug = parse_flag(KEY_DEBUG, &v)?;
        }
        c.location = get(KEY_LOCATION);
        if let Some(v) = get(KEY_EVENT_LOG) {
            c.event_log = PathBuf::from(v);
        }
        if let Some(v) = get(KEY_LOG_FILE) {
            c.log_file = PathBuf::from(v);
        }

        c.leviton = pair(&get, KEY_LEVITON_USER, KEY_LEVITON_PASS)?.map(|(email, password)| {
            LevitonSettings {
                email,
                password,
                residence_id: get(KEY_LEVITON_RESIDENCE)
                    .unwrap_or_else(|| DEFAULT_RESIDENCE_ID.into()),
                device_id: get(KEY_LEVITON_DEVICE).unwrap_or_else(|| DEFAULT_DEVICE_ID.into()),
            }
        });
        c.telegram = pair(&get, KEY_TELEGRAM_TOKEN, KEY_TELEGRAM_CHAT)?
            .map(|(token, chat_id)| TelegramSettings { token, chat_id });

        c.actuate_at = match get(KEY_ACTUATE_AT) {
            Some(v) if is_off(&v) => None,
            Some(v) => Some(v.parse().map_err(|_| ConfigError::Invalid {
                key: KEY_ACTUATE_AT,
                value: v,
            })?),
            None if c.leviton.is_some() => Some(DEFAULT_ACTUATE_AT),
            None => None,
        };

        if c.telegram.is_none() {
            warn!("Telegram credentials not set, notifications are disabled");
        }
        if c.leviton.is_none() {
            warn!("Leviton credentials not set, scheduled actuation is disabled");
        }

        c.validate()?;
        Ok(c)
    }

    /// Reject unusable combinations.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sensor_pin == self.power_pin {
            return Err(ConfigError::ValidationFailed(
                "sensor and power pins must be different lines",
            ));
        }
        if self.check_interval_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "check interval must be greater than zero",
            ));
        }
        if self.check_interval_secs > MAX_CHECK_INTERVAL_SECS {
            return Err(ConfigError::ValidationFailed(
                "check interval must not exceed one day",
            ));
        }
        if self.notify_cooldown_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "notification cooldown must be greater than zero",
            ));
        }
        if self.remote_timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "remote timeout must be greater than zero",
            ));
        }
        if self.actuate_at.is_some() && self.leviton.is_none() {
            return Err(ConfigError::ValidationFailed(
                "an actuation time needs Leviton credentials",
            ));
        }
        Ok(())
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    pub fn notify_cooldown(&self) -> TimeDelta {
        i64::try_from(self.notify_cooldown_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX)
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_secs(self.remote_timeout_secs)
    }

    /// Location label: the configured one, else the host name.
    pub fn location_label(&self) -> String {
        self.location
            .clone()
            .or_else(sysinfo::System::host_name)
            .unwrap_or_else(|| "unknown".to_string())
    }
}

// ── Parsing helpers ───────────────────────────────────────────

fn parse_key<T, G>(get: &G, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    get(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|_| ConfigError::Invalid { key, value: raw })
        })
        .transpose()
}

fn parse_flag(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: raw.to_string(),
        }),
    }
}

fn is_off(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "off" | "none" | "disabled"
    )
}

/// Both keys or neither; half a pair names the missing key.
fn pair<G>(
    get: &G,
    first: &'static str,
    second: &'static str,
) -> Result<Option<(String, String)>, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match (get(first), get(second)) {
        (Some(a), Some(b)) => Ok(Some((a, b))),
        (None, None) => Ok(None),
        (Some(_), None) => Err(ConfigError::Missing(second)),
        (None, Some(_)) => Err(ConfigError::Missing(first)),
    }
}
