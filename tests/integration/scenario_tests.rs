//! End-to-end scenarios for the monitor decision loop.
//!
//! Each test drives `WaterMonitor::tick` with explicit timestamps against
//! simulated GPIO and mock side channels.

use chrono::TimeDelta;
use waterwatch::app::events::MonitorEvent;
use waterwatch::app::messages;
use waterwatch::app::ports::{PowerState, WaterStatus};
use waterwatch::app::service::MonitorPhase;
use waterwatch::error::{Error, SensorError};
use waterwatch::scheduler::TriggerTime;
use waterwatch::shutdown::StopReason;

use crate::mock_ports::{FailingStore, LOCATION, Rig, at, plug_calls, ports, ports_with, sent};

fn seven() -> Option<TriggerTime> {
    TriggerTime::new(7, 0)
}

// ── Notification cooldown ─────────────────────────────────────

#[test]
fn unchanged_state_is_reported_again_only_after_cooldown() {
    let mut rig = Rig::new(true, None);
    let mut ports = ports();
    let t0 = at(8, 0, 0);

    let first = rig.monitor.tick(t0, &mut ports).unwrap().unwrap();
    assert!(first.evaluation.first_reading);
    assert_eq!(ports.store.all().len(), 1);
    assert_eq!(ports.store.all()[0].status, WaterStatus::Wet);
    assert_eq!(ports.store.all()[0].location, LOCATION);
    assert_eq!(ports.store.all()[0].action_taken, None);
    assert_eq!(sent(&ports).len(), 1);
    assert!(sent(&ports)[0].contains("Status: WET"));
    assert!(sent(&ports)[0].contains("Duration: 0:00:00"));
    assert_eq!(rig.monitor.state().last_notification_time, Some(t0));

    let quiet = rig
        .monitor
        .tick(t0 + TimeDelta::minutes(5 * 60 + 59), &mut ports)
        .unwrap()
        .unwrap();
    assert!(!quiet.evaluation.should_report());
    assert_eq!(ports.store.all().len(), 1);
    assert_eq!(sent(&ports).len(), 1);

    let t2 = t0 + TimeDelta::minutes(6 * 60 + 1);
    rig.monitor.tick(t2, &mut ports).unwrap();
    assert_eq!(ports.store.all().len(), 2);
    assert_eq!(
        ports.store.all()[1].action_taken.as_deref(),
        Some("Time since last reading: 6:01:00")
    );
    assert_eq!(sent(&ports).len(), 2);
    assert!(sent(&ports)[1].contains("Duration: 6:01:00"));
    assert_eq!(rig.monitor.state().last_notification_time, Some(t2));
}

#[test]
fn transition_is_reported_regardless_of_cooldown() {
    let mut rig = Rig::new(false, None);
    let mut ports = ports();
    let t0 = at(9, 0, 0);

    rig.monitor.tick(t0, &mut ports).unwrap();
    rig.monitor
        .tick(t0 + TimeDelta::minutes(2), &mut ports)
        .unwrap();
    assert_eq!(sent(&ports).len(), 1);

    rig.set_wet(true);
    let t1 = t0 + TimeDelta::minutes(4);
    let report = rig.monitor.tick(t1, &mut ports).unwrap().unwrap();
    assert!(report.evaluation.changed);

    assert_eq!(ports.store.all().len(), 2);
    assert_eq!(ports.store.all()[1].status, WaterStatus::Wet);
    assert_eq!(
        ports.store.all()[1].action_taken.as_deref(),
        Some("Time since last reading: 0:04:00")
    );
    assert_eq!(sent(&ports).len(), 2);
    assert!(sent(&ports)[1].starts_with("💧"));
    assert_eq!(rig.monitor.state().last_notification_time, Some(t1));
    assert!(rig.monitor.state().last_state);
}

// ── Actuation window ──────────────────────────────────────────

#[test]
fn plug_is_switched_on_once_in_the_trigger_minute() {
    let mut rig = Rig::new(true, seven());
    let mut ports = ports();

    rig.monitor.tick(at(6, 58, 0), &mut ports).unwrap();
    assert!(plug_calls(&ports).is_empty());

    let hit = rig.monitor.tick(at(7, 0, 1), &mut ports).unwrap().unwrap();
    assert!(hit.actuated);
    assert_eq!(plug_calls(&ports), &[PowerState::On]);
    assert!(sent(&ports).contains(&messages::actuated()));

    let again = rig.monitor.tick(at(7, 0, 40), &mut ports).unwrap().unwrap();
    assert!(!again.actuated);
    rig.monitor.tick(at(7, 1, 0), &mut ports).unwrap();
    assert_eq!(plug_calls(&ports), &[PowerState::On]);

    // Next morning is a new window.
    rig.monitor
        .tick(at(7, 0, 5) + TimeDelta::days(1), &mut ports)
        .unwrap();
    assert_eq!(plug_calls(&ports), &[PowerState::On, PowerState::On]);
}

#[test]
fn dry_probe_never_actuates() {
    let mut rig = Rig::new(false, seven());
    let mut ports = ports();
    rig.monitor.tick(at(7, 0, 0), &mut ports).unwrap();
    rig.monitor.tick(at(7, 0, 30), &mut ports).unwrap();
    assert!(plug_calls(&ports).is_empty());
}

#[test]
fn failed_actuation_is_notified_and_not_retried_in_the_same_minute() {
    let mut rig = Rig::new(true, seven());
    let mut ports = ports();
    ports.controller.as_mut().unwrap().fail = true;

    let report = rig.monitor.tick(at(7, 0, 0), &mut ports).unwrap().unwrap();
    assert!(report.actuated);
    assert!(
        sent(&ports)
            .iter()
            .any(|m| m == &messages::actuation_failed(&"request timed out"))
    );
    assert!(ports.sink.events.iter().any(|e| matches!(
        e,
        MonitorEvent::Actuated { result: Err(_), .. }
    )));

    rig.monitor.tick(at(7, 0, 50), &mut ports).unwrap();
    assert_eq!(plug_calls(&ports).len(), 1);
    assert_eq!(rig.monitor.phase(), MonitorPhase::Running);
}

// ── Sensor failure ────────────────────────────────────────────

#[test]
fn read_failure_powers_down_notifies_and_stops() {
    let mut rig = Rig::new(true, None);
    let mut ports = ports();
    rig.monitor.tick(at(10, 0, 0), &mut ports).unwrap();

    rig.input.push_reads(&[true, true]);
    rig.input.push_failure();
    let err = rig.monitor.tick(at(10, 2, 0), &mut ports).unwrap_err();

    assert_eq!(err, Error::Sensor(SensorError::ReadFailed { sample: 2 }));
    assert!(!rig.power.level());
    assert_eq!(rig.monitor.phase(), MonitorPhase::Stopped);

    let tail = &sent(&ports)[1..];
    assert_eq!(
        tail,
        &[
            messages::sensor_error(&SensorError::ReadFailed { sample: 2 }),
            messages::monitoring_error(&err),
        ]
    );
    assert!(matches!(
        ports.sink.events.last(),
        Some(MonitorEvent::Stopped(StopReason::SensorFault))
    ));

    // Terminal: nothing else is sampled.
    let reads = rig.input.reads();
    assert_eq!(rig.monitor.tick(at(10, 4, 0), &mut ports), Ok(None));
    assert_eq!(rig.input.reads(), reads);
}

#[test]
fn power_on_failure_is_fatal_and_leaves_line_low() {
    let mut rig = Rig::new(true, None);
    let mut ports = ports();
    rig.power.fail_set_high(true);

    let err = rig.monitor.tick(at(10, 0, 0), &mut ports).unwrap_err();
    assert_eq!(err, Error::Sensor(SensorError::PowerOnFailed));
    assert!(!rig.power.level());
    assert!(ports.store.all().is_empty());
}

// ── Best-effort side channels ─────────────────────────────────

#[test]
fn notifier_outage_keeps_monitoring_and_reports_every_iteration() {
    let mut rig = Rig::new(false, None);
    let mut ports = ports();
    ports.notifier.as_mut().unwrap().fail = true;

    for minute in [0, 2, 4] {
        rig.monitor.tick(at(11, minute, 0), &mut ports).unwrap();
    }
    // Never delivered, so every reading is still due.
    assert_eq!(ports.store.all().len(), 3);
    assert_eq!(ports.notifier.as_ref().unwrap().attempts, 3);
    assert_eq!(rig.monitor.state().last_notification_time, None);
    assert_eq!(rig.monitor.state().last_reading_time, Some(at(11, 4, 0)));
}

#[test]
fn store_outage_still_notifies_and_commits() {
    let mut rig = Rig::new(true, None);
    let mut ports = ports_with(FailingStore);

    rig.monitor.tick(at(12, 0, 0), &mut ports).unwrap();
    assert_eq!(sent(&ports).len(), 1);
    assert_eq!(rig.monitor.state().last_reading_time, Some(at(12, 0, 0)));
    assert_eq!(rig.monitor.state().last_notification_time, Some(at(12, 0, 0)));
}

#[test]
fn monitor_runs_without_optional_ports() {
    let mut rig = Rig::new(true, seven());
    let mut ports = ports();
    ports.controller = None;
    ports.notifier = None;

    let report = rig.monitor.tick(at(7, 0, 0), &mut ports).unwrap().unwrap();
    assert!(!report.actuated);
    rig.monitor.tick(at(7, 2, 0), &mut ports).unwrap();
    assert_eq!(ports.store.all().len(), 2);
}

// ── Lifecycle ─────────────────────────────────────────────────

#[test]
fn start_powers_down_and_announces() {
    let mut rig = Rig::new(false, None);
    let mut ports = ports();
    rig.monitor.start(&mut ports).unwrap();

    assert_eq!(rig.power.history(), vec![false]);
    assert_eq!(sent(&ports), &[messages::started()]);
    assert!(matches!(
        ports.sink.events.first(),
        Some(MonitorEvent::Started { location }) if location == LOCATION
    ));
}

#[test]
fn start_fails_when_line_cannot_be_driven_low() {
    let mut rig = Rig::new(false, None);
    let mut ports = ports();
    rig.power.fail_set_low(true);

    assert_eq!(
        rig.monitor.start(&mut ports),
        Err(Error::Sensor(SensorError::PowerOffFailed))
    );
    assert_eq!(rig.monitor.phase(), MonitorPhase::Stopped);
}
