//! Waterwatch entry point.
//!
//! Hexagonal layout: the binary builds the adapters, hands them to the
//! monitor core and drives it on a single-threaded executor.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  GpioChip (probe)   LevitonController  TelegramNotifier        │
//! │  JsonlEventStore    LogEventSink       SystemClock             │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              WaterMonitor (decision loop)              │    │
//! │  │  SensorSampler · StateEvaluator · ActuationScheduler   │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  StopHandle ◀── ctrlc (SIGINT / SIGTERM)                       │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::{info, warn};

use waterwatch::adapters::event_log::JsonlEventStore;
use waterwatch::adapters::leviton::LevitonController;
use waterwatch::adapters::log_sink::LogEventSink;
use waterwatch::adapters::telegram::TelegramNotifier;
use waterwatch::adapters::time::SystemClock;
use waterwatch::app::messages::TIMESTAMP_FORMAT;
use waterwatch::app::ports::{DeviceController, EventStore, PowerState};
use waterwatch::app::service::{MonitorPorts, WaterMonitor};
use waterwatch::config::{KEY_LEVITON_PASS, KEY_LEVITON_USER, MonitorConfig};
use waterwatch::drivers::gpio::{Delay, GpioChip};
use waterwatch::logging;
use waterwatch::sensors::SensorSampler;
use waterwatch::shutdown::{self, StopHandle, StopReason};

// ── Command line ──────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Verbose logging (same as WATER_DEBUG=1)
    #[arg(long, global = true)]
    debug: bool,

    /// Seconds between sensor checks (overrides WATER_CHECK_INTERVAL_SECS)
    #[arg(long, global = true, value_name = "SECS")]
    interval: Option<u64>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Watch the sensor until interrupted (default)
    Monitor,
    /// Print the most recent water events
    History {
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    /// Switch or query the smart plug
    Plug {
        #[arg(value_enum)]
        action: PlugAction,
    },
    /// List the switches in the configured residence
    Devices,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum PlugAction {
    On,
    Off,
    Status,
}

// ── Entry point ───────────────────────────────────────────────

fn main() -> Result<()> {
    let args = Args::parse();

    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("warning: could not load .env: {e}");
        }
    }

    let mut config = MonitorConfig::from_env().context("loading configuration")?;
    if args.debug {
        config.debug = true;
    }
    if let Some(secs) = args.interval {
        config.check_interval_secs = secs;
        config.validate().context("applying --interval")?;
    }

    let log = logging::init_logging(&config.log_file, config.debug)?;
    info!(
        "waterwatch {} logging to {}",
        env!("CARGO_PKG_VERSION"),
        log.log_file().display()
    );

    match args.command.unwrap_or(Command::Monitor) {
        Command::Monitor => run_monitor(&config),
        Command::History { limit } => print_history(&config, limit),
        Command::Plug { action } => plug(&config, action),
        Command::Devices => list_devices(&config),
    }
}

// ── Monitor ───────────────────────────────────────────────────

fn run_monitor(config: &MonitorConfig) -> Result<()> {
    let chip = GpioChip::new(&config.gpio_chip);
    let signal = chip
        .input(config.sensor_pin)
        .with_context(|| format!("opening sensor input GPIO{}", config.sensor_pin))?;
    let power = chip
        .output(config.power_pin)
        .with_context(|| format!("opening sensor power GPIO{}", config.power_pin))?;
    info!(
        "Probe on {} (input GPIO{}, power GPIO{})",
        chip.path().display(),
        config.sensor_pin,
        config.power_pin
    );
    let sampler = SensorSampler::new(signal, power, Delay);
    let mut monitor = WaterMonitor::from_config(sampler, config);

    let controller = config
        .leviton
        .as_ref()
        .map(|s| LevitonController::new(s, config.remote_timeout()))
        .transpose()
        .context("building Leviton client")?;
    let stop = StopHandle::new();
    let notifier = config
        .telegram
        .as_ref()
        .map(|s| TelegramNotifier::new(s, config.remote_timeout()))
        .transpose()
        .context("building Telegram client")?
        .map(|n| n.with_stop(stop.clone()));
    let store = JsonlEventStore::open(&config.event_log)
        .with_context(|| format!("opening event log {}", config.event_log.display()))?;
    info!("Recording water events to {}", store.path().display());

    let mut ports = MonitorPorts {
        controller,
        notifier,
        store,
        sink: LogEventSink::new(),
    };

    shutdown::install_signal_handler(stop.clone()).context("installing signal handler")?;

    println!("\nStarting water monitoring...");
    println!("Press CTRL+C to stop\n");

    // Single task today; the executor keeps room for more.
    let executor: edge_executor::LocalExecutor<'_, 8> = edge_executor::LocalExecutor::new();
    let outcome = futures_lite::future::block_on(executor.run(monitor.run(
        &mut ports,
        &SystemClock,
        &stop,
    )));

    match outcome {
        Ok(StopReason::Signal | StopReason::Requested) => {
            println!("\nMonitoring stopped by user");
            Ok(())
        }
        Ok(reason) => {
            warn!("Monitoring ended: {reason:?}");
            Ok(())
        }
        Err(e) => Err(anyhow::Error::new(e).context("monitoring failed")),
    }
}

// ── History ───────────────────────────────────────────────────

fn print_history(config: &MonitorConfig, limit: usize) -> Result<()> {
    let store = JsonlEventStore::open(&config.event_log)?;
    let events = store
        .recent_events(limit)
        .with_context(|| format!("reading {}", store.path().display()))?;

    if events.is_empty() {
        println!("No water events recorded in {}", store.path().display());
        return Ok(());
    }
    for event in events {
        println!(
            "{}  {:<3}  {:<16}  {}",
            event.timestamp.format(TIMESTAMP_FORMAT),
            event.status,
            event.location,
            event.action_taken.as_deref().unwrap_or("-"),
        );
    }
    Ok(())
}

// ── Smart plug ────────────────────────────────────────────────

fn controller(config: &MonitorConfig) -> Result<LevitonController> {
    let settings = config
        .leviton
        .as_ref()
        .with_context(|| format!("{KEY_LEVITON_USER} and {KEY_LEVITON_PASS} must be set"))?;
    Ok(LevitonController::new(settings, config.remote_timeout())?)
}

fn plug(config: &MonitorConfig, action: PlugAction) -> Result<()> {
    let mut leviton = controller(config)?;
    match action {
        PlugAction::On | PlugAction::Off => {
            let state = if matches!(action, PlugAction::On) {
                PowerState::On
            } else {
                PowerState::Off
            };
            leviton
                .set_power(state)
                .with_context(|| format!("turning plug {state}"))?;
            println!(
                "Plug turned {state} at {}",
                chrono::Local::now().format("%H:%M:%S")
            );
        }
        PlugAction::Status => {
            let state = leviton.power_status().context("reading plug status")?;
            println!("Plug is {state}");
        }
    }
    Ok(())
}

fn list_devices(config: &MonitorConfig) -> Result<()> {
    let devices = controller(config)?
        .list_devices()
        .context("listing devices")?;

    println!("\nAvailable Devices:");
    println!("-----------------");
    for device in devices {
        println!("Device ID: {}", device.id);
        println!("Name: {}", device.name.as_deref().unwrap_or("Unnamed"));
        println!("Type: {}", device.r#type.as_deref().unwrap_or("Unknown"));
        println!("Location: {}", device.location.as_deref().unwrap_or("Unknown"));
        println!("-----------------");
    }
    Ok(())
}
