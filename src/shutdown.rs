//! Cooperative stop request.
//!
//! A single `embassy-sync` [`Signal`] shared between whoever wants the
//! monitor to stop (the OS signal handler, a test) and the monitor loop,
//! which races it against its sleep timer. Setting the signal never blocks
//! and is safe from the `ctrlc` handler thread.

use std::sync::Arc;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use log::info;

/// Why the monitor left `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// SIGINT / SIGTERM.
    Signal,
    /// Programmatic stop through a [`StopHandle`].
    Requested,
    /// The sensor failed and the monitor shut itself down.
    SensorFault,
}

/// Cloneable handle on the shared stop signal.
#[derive(Clone)]
pub struct StopHandle {
    signal: Arc<Signal<CriticalSectionRawMutex, StopReason>>,
}

impl Default for StopHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl StopHandle {
    pub fn new() -> Self {
        Self {
            signal: Arc::new(Signal::new()),
        }
    }

    /// Ask the monitor to stop. Later requests overwrite the reason.
    pub fn request(&self, reason: StopReason) {
        self.signal.signal(reason);
    }

    /// Whether a stop is pending and not yet consumed by [`wait`](Self::wait).
    pub fn is_requested(&self) -> bool {
        self.signal.signaled()
    }

    /// Resolve once a stop is requested, consuming the request.
    pub async fn wait(&self) -> StopReason {
        self.signal.wait().await
    }
}

/// Route SIGINT and SIGTERM to `handle`.
pub fn install_signal_handler(handle: StopHandle) -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        info!("Stop signal received");
        handle.request(StopReason::Signal);
    })
}
