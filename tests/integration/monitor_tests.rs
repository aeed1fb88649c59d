//! Tests for the async monitor loop: cancellation, shutdown sequence and
//! real-timer pacing on the edge-executor.

use std::thread;
use std::time::{Duration, Instant};

use chrono::TimeDelta;
use waterwatch::adapters::time::ManualClock;
use waterwatch::app::events::MonitorEvent;
use waterwatch::app::messages;
use waterwatch::app::ports::Clock;
use waterwatch::app::service::MonitorPhase;
use waterwatch::error::{Error, SensorError};
use waterwatch::shutdown::{StopHandle, StopReason};

use crate::mock_ports::{Ports, Rig, at, ports, sent};

fn run(
    rig: &mut Rig,
    ports: &mut Ports,
    clock: &ManualClock,
    stop: &StopHandle,
) -> Result<StopReason, Error> {
    let executor: edge_executor::LocalExecutor<'_, 8> = edge_executor::LocalExecutor::new();
    futures_lite::future::block_on(executor.run(rig.monitor.run(ports, clock, stop)))
}

#[test]
fn pending_stop_shuts_down_before_first_sample() {
    let mut rig = Rig::new(true, None);
    let mut ports = ports();
    let clock = ManualClock::new(at(8, 0, 0));
    let stop = StopHandle::new();
    stop.request(StopReason::Requested);

    let reason = run(&mut rig, &mut ports, &clock, &stop).unwrap();

    assert_eq!(reason, StopReason::Requested);
    assert_eq!(rig.input.reads(), 0);
    assert!(!rig.power.level());
    assert_eq!(rig.monitor.phase(), MonitorPhase::Stopped);
    assert_eq!(
        sent(&ports),
        &[messages::started(), messages::stopped_by_user()]
    );
}

#[test]
fn stop_interrupts_a_long_sleep() {
    // One-hour interval: only a working stop signal ends this test quickly.
    let mut rig = Rig::with_interval(false, None, Duration::from_secs(3600));
    let mut ports = ports();
    let clock = ManualClock::new(at(8, 0, 0));
    let stop = StopHandle::new();

    let remote = stop.clone();
    let stopper = thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        remote.request(StopReason::Signal);
    });

    let started = Instant::now();
    let reason = run(&mut rig, &mut ports, &clock, &stop).unwrap();
    stopper.join().unwrap();

    assert_eq!(reason, StopReason::Signal);
    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(rig.monitor.iterations(), 1);
    assert_eq!(ports.store.all().len(), 1);
    assert!(!rig.power.level());
    assert!(matches!(
        ports.sink.events.last(),
        Some(MonitorEvent::Stopped(StopReason::Signal))
    ));
}

#[test]
fn loop_keeps_sampling_until_stopped() {
    let mut rig = Rig::with_interval(true, None, Duration::from_millis(10));
    let mut ports = ports();
    let clock = ManualClock::new(at(8, 0, 0));
    let stop = StopHandle::new();

    let remote = stop.clone();
    let stopper = thread::spawn(move || {
        thread::sleep(Duration::from_millis(300));
        remote.request(StopReason::Requested);
    });

    run(&mut rig, &mut ports, &clock, &stop).unwrap();
    stopper.join().unwrap();

    assert!(rig.monitor.iterations() >= 2);
    // The clock never moved, so only the first reading was reported.
    assert_eq!(ports.store.all().len(), 1);
    // Every sample ended with the probe powered down.
    let history = rig.power.history();
    assert_eq!(history.last(), Some(&false));
    assert!(history.windows(2).all(|w| !(w[0] && w[1])));
}

#[test]
fn sensor_failure_ends_run_with_error() {
    let mut rig = Rig::with_interval(true, None, Duration::from_millis(10));
    let mut ports = ports();
    let clock = ManualClock::new(at(8, 0, 0));
    let stop = StopHandle::new();
    rig.input.push_failure();

    let err = run(&mut rig, &mut ports, &clock, &stop).unwrap_err();

    assert_eq!(err, Error::Sensor(SensorError::ReadFailed { sample: 0 }));
    assert!(!rig.power.level());
    assert_eq!(rig.monitor.phase(), MonitorPhase::Stopped);
    assert_eq!(
        sent(&ports).last(),
        Some(&messages::monitoring_error(&err))
    );
}

#[test]
fn clock_is_read_each_iteration() {
    let mut rig = Rig::new(true, None);
    let mut ports = ports();
    let clock = ManualClock::new(at(8, 0, 0));

    rig.monitor.tick(clock.now(), &mut ports).unwrap();
    clock.advance(TimeDelta::hours(7));
    rig.monitor.tick(clock.now(), &mut ports).unwrap();

    assert_eq!(ports.store.all().len(), 2);
    assert_eq!(
        ports.store.all()[1].timestamp,
        at(8, 0, 0) + TimeDelta::hours(7)
    );
}
