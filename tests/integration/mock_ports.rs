//! Mock adapters for integration tests.
//!
//! Records every side-channel call so tests can assert on the full history
//! without a network, a plug or a Pi.

use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use waterwatch::adapters::event_log::MemoryEventStore;
use waterwatch::app::evaluator::StateEvaluator;
use waterwatch::app::events::MonitorEvent;
use waterwatch::app::ports::{
    DeviceController, EventSink, EventStore, Notifier, PowerState, WaterEvent,
};
use waterwatch::app::service::{MonitorPorts, WaterMonitor};
use waterwatch::drivers::sim::{SimDelay, SimInput, SimOutput};
use waterwatch::error::RemoteError;
use waterwatch::scheduler::{ActuationScheduler, TriggerTime};
use waterwatch::sensors::SensorSampler;

// ── Controller ────────────────────────────────────────────────

#[derive(Default)]
pub struct MockController {
    pub calls: Vec<PowerState>,
    pub fail: bool,
}

impl DeviceController for MockController {
    fn set_power(&mut self, state: PowerState) -> Result<(), RemoteError> {
        self.calls.push(state);
        if self.fail {
            Err(RemoteError::Timeout)
        } else {
            Ok(())
        }
    }
}

// ── Notifier ──────────────────────────────────────────────────

#[derive(Default)]
pub struct MockNotifier {
    pub sent: Vec<String>,
    pub attempts: usize,
    pub fail: bool,
}

impl Notifier for MockNotifier {
    fn send(&mut self, text: &str) -> Result<(), RemoteError> {
        self.attempts += 1;
        if self.fail {
            return Err(RemoteError::Http {
                status: 502,
                body: String::new(),
            });
        }
        self.sent.push(text.to_string());
        Ok(())
    }
}

// ── Stores ────────────────────────────────────────────────────

/// Store whose disk is always full.
pub struct FailingStore;

impl EventStore for FailingStore {
    fn log_event(&mut self, _: &WaterEvent) -> Result<(), RemoteError> {
        Err(RemoteError::Storage("No space left on device".into()))
    }

    fn recent_events(&self, _: usize) -> Result<Vec<WaterEvent>, RemoteError> {
        Ok(Vec::new())
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<MonitorEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn reports(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, MonitorEvent::StatusReported { .. }))
            .count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &MonitorEvent) {
        self.events.push(event.clone());
    }
}

// ── Rig ───────────────────────────────────────────────────────

pub type SimMonitor = WaterMonitor<SimInput, SimOutput, SimDelay>;
pub type Ports<S = MemoryEventStore> = MonitorPorts<MockController, MockNotifier, S, RecordingSink>;

pub const LOCATION: &str = "garden-pi";

/// A monitor on simulated lines, plus handles on those lines.
pub struct Rig {
    pub monitor: SimMonitor,
    pub input: SimInput,
    pub power: SimOutput,
}

#[allow(dead_code)]
impl Rig {
    pub fn new(wet: bool, trigger: Option<TriggerTime>) -> Self {
        Self::with_interval(wet, trigger, Duration::from_secs(120))
    }

    pub fn with_interval(wet: bool, trigger: Option<TriggerTime>, interval: Duration) -> Self {
        let input = SimInput::with_level(wet);
        let power = SimOutput::new();
        let sampler = SensorSampler::new(input.clone(), power.clone(), SimDelay::new());
        let monitor = WaterMonitor::new(
            sampler,
            StateEvaluator::new(TimeDelta::hours(6)),
            ActuationScheduler::new(trigger),
            LOCATION,
            interval,
        );
        Self {
            monitor,
            input,
            power,
        }
    }

    pub fn set_wet(&self, wet: bool) {
        self.input.set_level(wet);
    }
}

#[allow(dead_code)]
pub fn ports() -> Ports {
    ports_with(MemoryEventStore::new())
}

pub fn ports_with<S>(store: S) -> Ports<S> {
    MonitorPorts {
        controller: Some(MockController::default()),
        notifier: Some(MockNotifier::default()),
        store,
        sink: RecordingSink::default(),
    }
}

#[allow(dead_code)]
pub fn sent<S>(ports: &Ports<S>) -> &[String] {
    ports
        .notifier
        .as_ref()
        .map(|n| n.sent.as_slice())
        .unwrap_or_default()
}

#[allow(dead_code)]
pub fn plug_calls<S>(ports: &Ports<S>) -> &[PowerState] {
    ports
        .controller
        .as_ref()
        .map(|c| c.calls.as_slice())
        .unwrap_or_default()
}

/// 2024-06-01 at `h:m:s` local time.
pub fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 1)
        .unwrap()
        .and_hms_opt(h, m, s)
        .unwrap()
}
