//! Outbound monitor events.
//!
//! The [`WaterMonitor`](super::service::WaterMonitor) emits these through
//! the [`EventSink`](super::ports::EventSink) port. Adapters on the other
//! side decide what to do with them; the binary writes them to the log.

use chrono::{NaiveDateTime, TimeDelta};

use super::ports::WaterStatus;
use crate::error::{RemoteError, SensorError};
use crate::shutdown::StopReason;

/// Structured events emitted by the monitor core.
#[derive(Debug, Clone)]
pub enum MonitorEvent {
    /// The monitor has started and the probe is powered down.
    Started { location: String },

    /// One debounced reading was taken.
    Reading {
        at: NaiveDateTime,
        status: WaterStatus,
    },

    /// A status report (event + notification) was produced.
    StatusReported {
        at: NaiveDateTime,
        status: WaterStatus,
        first_reading: bool,
        changed: bool,
        elapsed: Option<TimeDelta>,
    },

    /// The smart plug was commanded on in the actuation window.
    Actuated {
        at: NaiveDateTime,
        result: Result<(), RemoteError>,
    },

    /// The probe could not be powered or read.
    SensorFault(SensorError),

    /// The loop left `Running`.
    Stopped(StopReason),
}
