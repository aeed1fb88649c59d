//! Resistive wet/dry probe with switched excitation.
//!
//! The probe is two exposed contacts: one fed from a GPIO power line, the
//! other wired to a pulled-down GPIO input. Water bridging the contacts
//! pulls the input HIGH.
//!
//! A sample energizes the probe, waits for it to settle, takes
//! [`SAMPLE_COUNT`] spaced reads and returns the strict majority. Single
//! glitches from noise or contact corrosion are outvoted.
//!
//! ## Safety contract
//!
//! The power line is low whenever [`SensorSampler::sample`] returns,
//! whether it returns a reading or an error. See [`crate::safety`].

use core::time::Duration;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use heapless::Vec;
use log::{debug, error};

use crate::error::SensorError;
use crate::pins::{SAMPLE_COUNT, SAMPLE_SPACING, SENSOR_STABILIZE};
use crate::safety::{PowerGuard, de_energize};

/// Strict majority vote: more than half of `readings` are `true`.
pub fn majority(readings: &[bool]) -> bool {
    let wet = readings.iter().filter(|&&r| r).count();
    wet * 2 > readings.len()
}

/// Settle and spacing delays for one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleTiming {
    pub stabilize: Duration,
    pub spacing: Duration,
}

impl Default for SampleTiming {
    fn default() -> Self {
        Self {
            stabilize: SENSOR_STABILIZE,
            spacing: SAMPLE_SPACING,
        }
    }
}

/// Owns the probe's signal line, power line and delay source.
pub struct SensorSampler<I, P, D> {
    signal: I,
    power: P,
    delay: D,
    timing: SampleTiming,
}

impl<I, P, D> SensorSampler<I, P, D>
where
    I: InputPin,
    P: OutputPin,
    D: DelayNs,
{
    pub fn new(signal: I, power: P, delay: D) -> Self {
        Self::with_timing(signal, power, delay, SampleTiming::default())
    }

    pub fn with_timing(signal: I, power: P, delay: D, timing: SampleTiming) -> Self {
        Self {
            signal,
            power,
            delay,
            timing,
        }
    }

    /// Take one debounced reading. `true` = wet.
    pub fn sample(&mut self) -> Result<bool, SensorError> {
        debug!("probe: starting water check");
        let guard = PowerGuard::energize(&mut self.power)?;
        self.delay.delay_us(micros(self.timing.stabilize));

        let mut readings: Vec<bool, SAMPLE_COUNT> = Vec::new();
        for index in 0..SAMPLE_COUNT {
            let reading = match self.signal.is_high() {
                Ok(level) => level,
                Err(e) => {
                    error!("probe: read {index} failed: {e:?}");
                    // Dropping the guard drives the line low before we return.
                    drop(guard);
                    return Err(SensorError::ReadFailed {
                        sample: index as u8,
                    });
                }
            };
            debug!("probe: sensor reading {index}: {reading}");
            // Capacity is SAMPLE_COUNT and the loop runs SAMPLE_COUNT times.
            let _ = readings.push(reading);
            self.delay.delay_us(micros(self.timing.spacing));
        }

        guard.release()?;

        let wet = majority(&readings);
        debug!("probe: water check result: {wet} ({readings:?})");
        Ok(wet)
    }

    /// De-energize the probe outside of a sample (startup, shutdown).
    pub fn power_off(&mut self) -> Result<(), SensorError> {
        de_energize(&mut self.power)
    }
}

fn micros(d: Duration) -> u32 {
    u32::try_from(d.as_micros()).unwrap_or(u32::MAX)
}
