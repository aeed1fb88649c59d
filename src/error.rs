//! Unified error types for the water monitor.
//!
//! A single [`Error`] enum that every subsystem converts into. Each kind
//! has a fixed place where it is handled:
//!
//! - [`SensorError`]: fatal to the current run; triggers safe shutdown.
//! - [`RemoteError`]: a side channel (store, notifier, plug) failed;
//!   logged and swallowed at the point of use.
//! - [`ConfigError`]: fatal at startup, before the loop begins.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the monitor funnels into this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The wet/dry sensor could not be powered or read.
    Sensor(SensorError),
    /// A remote side channel failed.
    Remote(RemoteError),
    /// Configuration is missing or invalid.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Remote(e) => write!(f, "remote: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// Driving the sensor power line high failed.
    PowerOnFailed,
    /// Driving the sensor power line low failed.
    PowerOffFailed,
    /// A digital read of the signal line failed (index of the sample).
    ReadFailed { sample: u8 },
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PowerOnFailed => write!(f, "failed to energize sensor power line"),
            Self::PowerOffFailed => write!(f, "failed to de-energize sensor power line"),
            Self::ReadFailed { sample } => write!(f, "GPIO read failed on sample {sample}"),
        }
    }
}

impl std::error::Error for SensorError {}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Remote side-channel errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The remote endpoint answered with a non-success HTTP status.
    Http { status: u16, body: String },
    /// The request did not complete within the configured timeout.
    Timeout,
    /// Connection-level failure (DNS, TLS, refused, reset).
    Transport(String),
    /// Login was rejected or the session could not be established.
    Auth(String),
    /// The response body did not have the expected shape.
    Decode(String),
    /// The local event store could not be read or written.
    Storage(String),
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http { status, body } if body.is_empty() => write!(f, "HTTP {status}"),
            Self::Http { status, body } => write!(f, "HTTP {status}: {body}"),
            Self::Timeout => write!(f, "request timed out"),
            Self::Transport(msg) => write!(f, "transport error: {msg}"),
            Self::Auth(msg) => write!(f, "authentication failed: {msg}"),
            Self::Decode(msg) => write!(f, "unexpected response: {msg}"),
            Self::Storage(msg) => write!(f, "event store: {msg}"),
        }
    }
}

impl std::error::Error for RemoteError {}

impl From<RemoteError> for Error {
    fn from(e: RemoteError) -> Self {
        Self::Remote(e)
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        // The Telegram URL carries the bot token.
        let e = e.without_url();
        if e.is_timeout() {
            Self::Timeout
        } else if let Some(status) = e.status() {
            Self::Http {
                status: status.as_u16(),
                body: String::new(),
            }
        } else if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

impl From<std::io::Error> for RemoteError {
    fn from(e: std::io::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required key is absent.
    Missing(&'static str),
    /// A key is present but could not be parsed.
    Invalid { key: &'static str, value: String },
    /// The combination of values is unusable.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(key) => write!(f, "missing required setting {key}"),
            Self::Invalid { key, value } => write!(f, "invalid value {value:?} for {key}"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
