//! # Console Monitor
//!
//! Runs the bridge against the in-memory simulator and prints every change
//! of the tracked aircraft values to stdout. The simulated aircraft climbs
//! and accelerates while the example runs, and quits halfway through so the
//! reconnect path is visible too.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --example console_monitor
//! cargo run --example console_monitor -- settings.json
//! SIMLINK_LOG_MODE=development cargo run --example console_monitor
//! ```
//!
//! The optional settings file has the shape
//! `{"bridge": {"poll_interval_ms": 500}, "properties": [...]}`; without one
//! the default aircraft set is tracked at a one second cadence.

use std::error::Error;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use sim_api::memory::InMemorySimulator;
use sim_bridge::prelude::*;
use sim_bridge::{init_logging_from_env, DEFAULT_NOTIFICATION_CODE};
use telemetry_store::TelemetryStore;

const RUN_FOR: Duration = Duration::from_secs(12);
const PUMP_EVERY: Duration = Duration::from_millis(100);

fn main() -> Result<(), Box<dyn Error>> {
    init_logging_from_env()?;

    let settings = match std::env::args().nth(1) {
        Some(path) => BridgeSettings::from_path(path)?,
        None => BridgeSettings::default(),
    };

    let sim = InMemorySimulator::running();
    seed_aircraft(&sim, 0.0);

    let store = Arc::new(TelemetryStore::new());
    store.watch_status();
    for property in &settings.registry {
        store.watch(property.id);
    }

    let registry = Arc::new(settings.registry);
    let handle = spawn_bridge(
        sim.clone(),
        settings.config,
        Arc::clone(&registry),
        store.clone(),
    )?;
    handle.window_ready(HostWindow::NONE)?;

    println!("Monitoring {} properties for {:?}", registry.len(), RUN_FOR);

    let changes = store.iter();
    let steps = (RUN_FOR.as_millis() / PUMP_EVERY.as_millis()) as u32;
    for step in 0..steps {
        let elapsed = PUMP_EVERY * step;
        seed_aircraft(&sim, elapsed.as_secs_f64());

        if step == steps / 2 {
            println!("-- simulator quits --");
            sim.quit();
        }
        if step == steps / 2 + 20 {
            println!("-- simulator restarts --");
            sim.set_running(true);
        }

        // Stand-in for the host window procedure
        handle.notify(DEFAULT_NOTIFICATION_CODE)?;
        thread::sleep(PUMP_EVERY);

        for event in changes.try_iter() {
            match event.property_id() {
                Some(id) => {
                    let name = registry
                        .get(id)
                        .map(|p| p.field_name.as_str())
                        .unwrap_or("?");
                    println!(
                        "{:>32}: {:>12} {}",
                        name,
                        store.text(id).unwrap_or_default(),
                        store.unit(id).unwrap_or_default()
                    );
                }
                None => println!("status: {}", store.status().unwrap_or_default()),
            }
        }
    }

    handle.window_closing()?;
    handle.join()?;
    println!("status: {}", store.status().unwrap_or_default());

    Ok(())
}

/// Fly a slow climbing turn out of Seattle.
fn seed_aircraft(sim: &InMemorySimulator, t: f64) {
    sim.set_value(PropertyId::new(1), -122.3321 + t * 0.001);
    sim.set_value(PropertyId::new(2), 47.6062 + t * 0.0005);
    sim.set_value(PropertyId::new(3), (270.0 + t * 3.0) % 360.0);
    sim.set_value(PropertyId::new(4), (1500.0 + t * 25.0).round());
    sim.set_value(PropertyId::new(5), (140.0 + t).round());
}
