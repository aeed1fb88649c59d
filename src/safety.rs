//! Sensor power-line safety.
//!
//! The probe is only excited while it is being sampled. Leaving it
//! energized between samples corrodes the contacts and, after a fault,
//! leaves a live line on a wet probe. Two rules enforce this:
//!
//! 1. While sampling, the line is held through a [`PowerGuard`]. The guard
//!    drives the line low when released *and* when dropped, so early
//!    returns, `?` propagation and unwinding all leave the line low.
//! 2. Outside sampling, [`de_energize`] is called at startup and by the
//!    shutdown sequence regardless of what the last sample did.

use embedded_hal::digital::OutputPin;
use log::error;

use crate::error::SensorError;

/// Drive the power line low, logging the underlying HAL error on failure.
pub fn de_energize<P: OutputPin>(line: &mut P) -> Result<(), SensorError> {
    line.set_low().map_err(|e| {
        error!("SAFETY: sensor power line set_low failed: {e:?}");
        SensorError::PowerOffFailed
    })
}

/// Holds the sensor power line high for the lifetime of the guard.
pub struct PowerGuard<'a, P: OutputPin> {
    line: &'a mut P,
    armed: bool,
}

impl<'a, P: OutputPin> PowerGuard<'a, P> {
    /// Energize the line. If driving it high fails, the line is driven
    /// low again before the error is returned.
    pub fn energize(line: &'a mut P) -> Result<Self, SensorError> {
        if let Err(e) = line.set_high() {
            error!("SAFETY: sensor power line set_high failed: {e:?}");
            let _ = de_energize(line);
            return Err(SensorError::PowerOnFailed);
        }
        Ok(Self { line, armed: true })
    }

    /// De-energize explicitly and report whether it worked.
    pub fn release(mut self) -> Result<(), SensorError> {
        self.armed = false;
        de_energize(self.line)
    }
}

impl<P: OutputPin> Drop for PowerGuard<'_, P> {
    fn drop(&mut self) {
        if self.armed {
            // Error already logged; nothing else can be done from drop.
            let _ = de_energize(self.line);
        }
    }
}
