//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured monitor events through
//! the `log` facade, which the binary routes to the console and the
//! durable log file.

use log::{debug, info, warn};

use crate::app::events::MonitorEvent;
use crate::app::messages::format_elapsed;
use crate::app::ports::EventSink;

/// Adapter that logs every [`MonitorEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &MonitorEvent) {
        match event {
            MonitorEvent::Started { location } => {
                info!("START | location={location}");
            }
            MonitorEvent::Reading { at, status } => {
                debug!("READ  | {at} | {status}");
            }
            MonitorEvent::StatusReported {
                at,
                status,
                first_reading,
                changed,
                elapsed,
            } => {
                info!(
                    "REPORT| {at} | {status} | first={first_reading} changed={changed} | since={}",
                    elapsed.map_or_else(|| "-".to_string(), format_elapsed)
                );
            }
            MonitorEvent::Actuated { at, result } => match result {
                Ok(()) => info!("PLUG  | {at} | ON"),
                Err(e) => warn!("PLUG  | {at} | failed: {e}"),
            },
            MonitorEvent::SensorFault(e) => {
                warn!("FAULT | {e}");
            }
            MonitorEvent::Stopped(reason) => {
                info!("STOP  | {reason:?}");
            }
        }
    }
}
