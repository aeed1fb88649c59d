//! Monitor service, the hexagonal core.
//!
//! [`WaterMonitor`] owns the sampler, the detector state and the policy
//! objects. All I/O beyond the probe flows through port traits handed in
//! at call sites, so the whole loop runs against mock adapters in tests.
//!
//! ```text
//!                    ┌──────────────────────────┐ ──▶ EventStore
//!  probe (e-hal) ──▶ │       WaterMonitor       │ ──▶ Notifier
//!          Clock ──▶ │ sample · evaluate · plan │ ──▶ DeviceController
//!                    └──────────────────────────┘ ──▶ EventSink
//! ```

use core::time::Duration;

use chrono::{NaiveDateTime, TimeDelta, Timelike};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use futures_lite::future;
use log::{debug, error, info, warn};

use crate::config::MonitorConfig;
use crate::error::{Error, SensorError};
use crate::scheduler::ActuationScheduler;
use crate::sensors::SensorSampler;
use crate::shutdown::{StopHandle, StopReason};

use super::evaluator::{DetectorState, Evaluation, StateEvaluator};
use super::events::MonitorEvent;
use super::messages;
use super::ports::{
    Clock, DeviceController, EventSink, EventStore, Notifier, PowerState, WaterEvent, WaterStatus,
};

// ───────────────────────────────────────────────────────────────
// Ports bundle
// ───────────────────────────────────────────────────────────────

/// Side-channel adapters the monitor talks to.
///
/// The controller and notifier are optional; without them the monitor
/// still samples, evaluates and persists.
pub struct MonitorPorts<C, N, S, K> {
    pub controller: Option<C>,
    pub notifier: Option<N>,
    pub store: S,
    pub sink: K,
}

impl<C, N, S, K> MonitorPorts<C, N, S, K>
where
    N: Notifier,
{
    /// Best-effort send. `true` only if a notifier delivered the text.
    fn notify(&mut self, text: &str) -> bool {
        let Some(notifier) = self.notifier.as_mut() else {
            return false;
        };
        match notifier.send(text) {
            Ok(()) => true,
            Err(e) => {
                warn!("Notification failed: {e}");
                false
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// WaterMonitor
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorPhase {
    Running,
    /// Terminal. Set by the shutdown sequence.
    Stopped,
}

/// What one iteration did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub wet: bool,
    pub evaluation: Evaluation,
    /// The plug was commanded on during this iteration.
    pub actuated: bool,
}

pub struct WaterMonitor<I, P, D> {
    sampler: SensorSampler<I, P, D>,
    evaluator: StateEvaluator,
    scheduler: ActuationScheduler,
    state: DetectorState,
    location: String,
    interval: Duration,
    phase: MonitorPhase,
    /// Start of the trigger minute the plug was last commanded in.
    last_actuation_minute: Option<NaiveDateTime>,
    iterations: u64,
}

impl<I, P, D> WaterMonitor<I, P, D>
where
    I: InputPin,
    P: OutputPin,
    D: DelayNs,
{
    pub fn new(
        sampler: SensorSampler<I, P, D>,
        evaluator: StateEvaluator,
        scheduler: ActuationScheduler,
        location: impl Into<String>,
        interval: Duration,
    ) -> Self {
        Self {
            sampler,
            evaluator,
            scheduler,
            state: DetectorState::default(),
            location: location.into(),
            interval,
            phase: MonitorPhase::Running,
            last_actuation_minute: None,
            iterations: 0,
        }
    }

    /// Build from validated configuration.
    pub fn from_config(sampler: SensorSampler<I, P, D>, config: &MonitorConfig) -> Self {
        Self::new(
            sampler,
            StateEvaluator::new(config.notify_cooldown()),
            ActuationScheduler::new(config.actuate_at),
            config.location_label(),
            config.check_interval(),
        )
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Power the probe down, announce startup.
    pub fn start<C, N, S, K>(&mut self, ports: &mut MonitorPorts<C, N, S, K>) -> Result<(), Error>
    where
        N: Notifier,
        K: EventSink,
    {
        if let Err(e) = self.sampler.power_off() {
            let err = Error::Sensor(e);
            self.shutdown(StopReason::SensorFault, Some(&err), ports);
            return Err(err);
        }
        ports.sink.emit(&MonitorEvent::Started {
            location: self.location.clone(),
        });
        info!("Water detector initialized at {}", self.location);
        ports.notify(&messages::started());
        Ok(())
    }

    /// Start, then loop until a stop is requested or the sensor fails.
    ///
    /// The sleep between iterations races the stop signal, so a stop
    /// request takes effect immediately rather than after the interval.
    pub async fn run<C, N, S, K>(
        &mut self,
        ports: &mut MonitorPorts<C, N, S, K>,
        clock: &impl Clock,
        stop: &StopHandle,
    ) -> Result<StopReason, Error>
    where
        C: DeviceController,
        N: Notifier,
        S: EventStore,
        K: EventSink,
    {
        self.start(ports)?;
        info!("Starting water monitoring every {:?}", self.interval);

        loop {
            if stop.is_requested() {
                let reason = stop.wait().await;
                self.shutdown(reason, None, ports);
                return Ok(reason);
            }

            self.tick(clock.now(), ports)?;

            let sleep = self.scheduler.next_wake(clock.now(), self.interval);
            let woke = future::or(async { Some(stop.wait().await) }, async {
                async_io_mini::Timer::after(sleep).await;
                None
            })
            .await;

            if let Some(reason) = woke {
                self.shutdown(reason, None, ports);
                return Ok(reason);
            }
        }
    }

    // ── Per-iteration orchestration ───────────────────────────

    /// Run one iteration: sample → evaluate → actuate → report → commit.
    ///
    /// Returns `Ok(None)` once the monitor is stopped. A sensor failure
    /// notifies, runs the shutdown sequence and is returned as the error.
    pub fn tick<C, N, S, K>(
        &mut self,
        now: NaiveDateTime,
        ports: &mut MonitorPorts<C, N, S, K>,
    ) -> Result<Option<TickReport>, Error>
    where
        C: DeviceController,
        N: Notifier,
        S: EventStore,
        K: EventSink,
    {
        if self.phase == MonitorPhase::Stopped {
            return Ok(None);
        }
        self.iterations += 1;

        // 1. Sample
        let wet = match self.sampler.sample() {
            Ok(wet) => wet,
            Err(e) => return Err(self.sensor_failed(e, ports)),
        };
        let status = WaterStatus::from_wet(wet);
        debug!("Current state: {status} at {now}");
        ports.sink.emit(&MonitorEvent::Reading { at: now, status });

        // 2. Evaluate
        let evaluation = self.evaluator.evaluate(wet, &self.state, now);

        // 3. Actuation window
        let actuated = self.actuate_if_due(now, wet, ports);

        // 4. Report and commit
        if evaluation.should_report() {
            self.report(now, status, &evaluation, ports);
            self.state.commit_reading(wet, now);
        }

        Ok(Some(TickReport {
            wet,
            evaluation,
            actuated,
        }))
    }

    /// De-energize the probe, send the farewell, enter `Stopped`.
    ///
    /// Idempotent: a stopped monitor does nothing.
    pub fn shutdown<C, N, S, K>(
        &mut self,
        reason: StopReason,
        cause: Option<&Error>,
        ports: &mut MonitorPorts<C, N, S, K>,
    ) where
        N: Notifier,
        K: EventSink,
    {
        if self.phase == MonitorPhase::Stopped {
            return;
        }
        self.phase = MonitorPhase::Stopped;

        if let Err(e) = self.sampler.power_off() {
            error!("Shutdown could not de-energize the probe: {e}");
        }

        match cause {
            Some(err) => {
                error!("Monitoring error: {err}");
                ports.notify(&messages::monitoring_error(err));
            }
            None => {
                info!("Monitoring stopped ({reason:?})");
                ports.notify(&messages::stopped_by_user());
            }
        }
        ports.sink.emit(&MonitorEvent::Stopped(reason));
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn phase(&self) -> MonitorPhase {
        self.phase
    }

    pub fn state(&self) -> &DetectorState {
        &self.state
    }

    /// Iterations that sampled the probe, including a failed last one.
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    // ── Internal ──────────────────────────────────────────────

    fn sensor_failed<C, N, S, K>(
        &mut self,
        e: SensorError,
        ports: &mut MonitorPorts<C, N, S, K>,
    ) -> Error
    where
        N: Notifier,
        K: EventSink,
    {
        error!("Error checking water: {e}");
        ports.sink.emit(&MonitorEvent::SensorFault(e));
        ports.notify(&messages::sensor_error(&e));
        let err = Error::Sensor(e);
        self.shutdown(StopReason::SensorFault, Some(&err), ports);
        err
    }

    /// Switch the plug on at most once per trigger minute.
    fn actuate_if_due<C, N, S, K>(
        &mut self,
        now: NaiveDateTime,
        wet: bool,
        ports: &mut MonitorPorts<C, N, S, K>,
    ) -> bool
    where
        C: DeviceController,
        N: Notifier,
        K: EventSink,
    {
        if !self.scheduler.should_actuate(&now, wet) {
            return false;
        }
        let minute = minute_start(now);
        if minute.is_some() && self.last_actuation_minute == minute {
            debug!("Plug already commanded in this window");
            return false;
        }
        self.last_actuation_minute = minute;

        let Some(controller) = ports.controller.as_mut() else {
            warn!("Actuation window reached but no device controller is configured");
            return false;
        };

        let result = controller.set_power(PowerState::On);
        match &result {
            Ok(()) => {
                info!("Turning plug on.");
                ports.notify(&messages::actuated());
            }
            Err(e) => {
                warn!("Failed to turn plug on: {e}");
                ports.notify(&messages::actuation_failed(e));
            }
        }
        ports
            .sink
            .emit(&MonitorEvent::Actuated { at: now, result });
        true
    }

    fn report<C, N, S, K>(
        &mut self,
        now: NaiveDateTime,
        status: WaterStatus,
        evaluation: &Evaluation,
        ports: &mut MonitorPorts<C, N, S, K>,
    ) where
        N: Notifier,
        S: EventStore,
        K: EventSink,
    {
        info!("Status changed to: {status}");

        let event = WaterEvent {
            timestamp: now,
            status,
            location: self.location.clone(),
            action_taken: evaluation.elapsed.map(messages::time_since_last_reading),
        };
        if let Err(e) = ports.store.log_event(&event) {
            warn!("Failed to persist water event: {e}");
        }

        let elapsed = evaluation.elapsed.unwrap_or_else(TimeDelta::zero);
        let text = messages::status_update(&self.location, status, now, elapsed);
        if ports.notify(&text) {
            self.state.record_notification(now);
        }

        ports.sink.emit(&MonitorEvent::StatusReported {
            at: now,
            status,
            first_reading: evaluation.first_reading,
            changed: evaluation.changed,
            elapsed: evaluation.elapsed,
        });
    }
}

fn minute_start(at: NaiveDateTime) -> Option<NaiveDateTime> {
    at.date().and_hms_opt(at.hour(), at.minute(), 0)
}
