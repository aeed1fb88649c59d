//! Port traits: the hexagonal boundary between the monitor and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ WaterMonitor (domain)
//! ```
//!
//! Driven adapters (smart plug, chat notifier, event history, clock, log
//! sink) implement these traits. The [`WaterMonitor`](super::service::WaterMonitor)
//! consumes them via generics, so the domain core never opens a socket or
//! a file itself. Sensor I/O goes through the `embedded-hal` traits instead
//! (see [`crate::sensors`]).
//!
//! Every remote port returns [`RemoteError`]; callers treat those failures
//! as best-effort side channels and keep monitoring.

use core::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::RemoteError;

// ───────────────────────────────────────────────────────────────
// Domain types crossing the boundary
// ───────────────────────────────────────────────────────────────

/// Debounced probe state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WaterStatus {
    Wet,
    Dry,
}

impl WaterStatus {
    pub fn from_wet(wet: bool) -> Self {
        if wet { Self::Wet } else { Self::Dry }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Wet => "WET",
            Self::Dry => "DRY",
        }
    }
}

impl fmt::Display for WaterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One row of the append-only event history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaterEvent {
    pub timestamp: NaiveDateTime,
    pub status: WaterStatus,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_taken: Option<String>,
}

/// Requested smart-plug state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PowerState {
    On,
    Off,
}

impl PowerState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::On => "ON",
            Self::Off => "OFF",
        }
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

// ───────────────────────────────────────────────────────────────
// Device controller port (domain → smart plug)
// ───────────────────────────────────────────────────────────────

/// Switches the remote actuator.
pub trait DeviceController {
    fn set_power(&mut self, state: PowerState) -> Result<(), RemoteError>;
}

// ───────────────────────────────────────────────────────────────
// Notifier port (domain → chat channel)
// ───────────────────────────────────────────────────────────────

/// Delivers a human-readable message. Failures never stop monitoring.
pub trait Notifier {
    fn send(&mut self, text: &str) -> Result<(), RemoteError>;
}

// ───────────────────────────────────────────────────────────────
// Event store port (domain ↔ history)
// ───────────────────────────────────────────────────────────────

/// Append-only event history.
pub trait EventStore {
    /// Append one event. Existing events are never modified.
    fn log_event(&mut self, event: &WaterEvent) -> Result<(), RemoteError>;

    /// Up to `limit` events, newest first.
    fn recent_events(&self, limit: usize) -> Result<Vec<WaterEvent>, RemoteError>;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Local wall-clock time.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`MonitorEvent`](super::events::MonitorEvent)s
/// through this port. Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::MonitorEvent);
}

// Forwarding impls so callers can lend adapters instead of moving them.

impl<T: DeviceController + ?Sized> DeviceController for &mut T {
    fn set_power(&mut self, state: PowerState) -> Result<(), RemoteError> {
        (**self).set_power(state)
    }
}

impl<T: Notifier + ?Sized> Notifier for &mut T {
    fn send(&mut self, text: &str) -> Result<(), RemoteError> {
        (**self).send(text)
    }
}

impl<T: EventStore + ?Sized> EventStore for &mut T {
    fn log_event(&mut self, event: &WaterEvent) -> Result<(), RemoteError> {
        (**self).log_event(event)
    }

    fn recent_events(&self, limit: usize) -> Result<Vec<WaterEvent>, RemoteError> {
        (**self).recent_events(limit)
    }
}

impl<T: EventSink + ?Sized> EventSink for &mut T {
    fn emit(&mut self, event: &super::events::MonitorEvent) {
        (**self).emit(event)
    }
}
