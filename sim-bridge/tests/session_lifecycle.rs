//! Session lifecycle against the in-memory simulator: connect, register,
//! poll, route, quit and reconnect.

mod helpers;

use std::sync::Arc;

use helpers::{altitude_registry, numbered_registry, session_with, RecordingSink, SinkCall};
use sim_api::memory::{InMemorySimulator, SimCall, SimOperation};
use sim_api::{DataType, InboundMessage};
use sim_bridge::{
    BridgeConfig, MessagePumpAdapter, PropertyId, PropertyRegistry, RequestScheduler,
    SessionState, TickOutcome, DEFAULT_NOTIFICATION_CODE,
};
use telemetry_store::TelemetryStore;

fn notify<C: sim_api::SimConnector>(session: &mut sim_bridge::SessionManager<C>) {
    let pump = MessagePumpAdapter::default();
    assert!(pump.on_platform_message(DEFAULT_NOTIFICATION_CODE, session));
}

#[test]
fn test_end_to_end_altitude() {
    let sim = InMemorySimulator::running();
    sim.set_value(PropertyId::new(1), 3500.0);
    let sink = RecordingSink::new();
    let mut session = session_with(
        &sim,
        BridgeConfig::default(),
        altitude_registry(),
        sink.clone(),
    );
    let mut scheduler = RequestScheduler::new();

    assert_eq!(scheduler.on_tick(&mut session), TickOutcome::Connected);
    notify(&mut session);
    assert_eq!(scheduler.on_tick(&mut session), TickOutcome::Requested(1));
    notify(&mut session);

    sim.quit();
    notify(&mut session);

    assert_eq!(
        sink.calls(),
        vec![
            SinkCall::Unit(PropertyId::new(1), "feet".to_string()),
            SinkCall::Status("Connected".to_string()),
            SinkCall::Value(PropertyId::new(1), "3500".to_string()),
            SinkCall::Status("Disconnected".to_string()),
        ]
    );
    assert_eq!(session.state(), SessionState::Disconnected);
    assert!(!sim.is_session_open());
}

#[test]
fn test_reconnect_registers_from_scratch() {
    let sim = InMemorySimulator::running();
    sim.set_value(PropertyId::new(2), 120.0);
    let sink = RecordingSink::new();
    let mut session = session_with(
        &sim,
        BridgeConfig::default(),
        numbered_registry(3),
        sink.clone(),
    );
    let mut scheduler = RequestScheduler::new();

    scheduler.on_tick(&mut session);
    sim.quit();
    notify(&mut session);
    assert!(!session.is_connected());

    // Simulator comes back
    assert_eq!(scheduler.on_tick(&mut session), TickOutcome::ConnectFailed);
    sim.set_running(true);
    assert_eq!(scheduler.on_tick(&mut session), TickOutcome::Connected);

    let ids: Vec<_> = (1..=3).map(PropertyId::new).collect();
    let twice: Vec<_> = ids.iter().chain(ids.iter()).copied().collect();
    assert_eq!(sim.declared_ids(), twice);
    assert_eq!(sim.session_count(), 2);
    assert_eq!(session.stats().registrations, 2);

    // The fresh connection answers requests again
    assert_eq!(scheduler.on_tick(&mut session), TickOutcome::Requested(3));
    notify(&mut session);
    assert_eq!(sink.values(), vec![(PropertyId::new(2), "120".to_string())]);
}

#[test]
fn test_registration_precedes_first_request() {
    let sim = InMemorySimulator::running();
    let mut session = session_with(
        &sim,
        BridgeConfig::default(),
        numbered_registry(4),
        RecordingSink::new(),
    );
    let mut scheduler = RequestScheduler::new();

    scheduler.on_tick(&mut session);
    scheduler.on_tick(&mut session);

    let calls = sim.calls();
    let last_bind = calls
        .iter()
        .rposition(|c| matches!(c, SimCall::BindDecoder { .. }))
        .unwrap();
    let first_request = calls
        .iter()
        .position(|c| matches!(c, SimCall::Request { .. }))
        .unwrap();

    assert!(last_bind < first_request);
    assert_eq!(sim.declared_ids().len(), 4);
    assert_eq!(sim.requested_ids().len(), 4);
}

#[test]
fn test_failed_request_aborts_tick() {
    let sim = InMemorySimulator::running();
    let sink = RecordingSink::new();
    let mut session = session_with(
        &sim,
        BridgeConfig::default(),
        numbered_registry(3),
        sink.clone(),
    );
    let mut scheduler = RequestScheduler::new();

    scheduler.on_tick(&mut session);
    sim.fail_after(SimOperation::Request, 1);

    assert_eq!(scheduler.on_tick(&mut session), TickOutcome::RequestFailed);
    assert_eq!(session.state(), SessionState::Disconnected);
    assert_eq!(
        sim.requested_ids(),
        vec![PropertyId::new(1), PropertyId::new(2)]
    );
    assert_eq!(sink.statuses(), vec!["Disconnected".to_string()]);
}

#[test]
fn test_unavailable_simulator_retried_every_tick() {
    let sim = InMemorySimulator::new();
    let sink = RecordingSink::new();
    let mut session = session_with(
        &sim,
        BridgeConfig::default(),
        altitude_registry(),
        sink.clone(),
    );
    let mut scheduler = RequestScheduler::new();

    for _ in 0..3 {
        assert_eq!(scheduler.on_tick(&mut session), TickOutcome::ConnectFailed);
    }

    assert_eq!(sim.open_attempts(), 3);
    assert_eq!(sink.count_status("Simulator not available"), 3);
    assert_eq!(session.stats().connect_attempts, 3);

    sim.set_running(true);
    assert_eq!(scheduler.on_tick(&mut session), TickOutcome::Connected);
}

#[test]
fn test_lazy_quit_fails_on_next_request() {
    let sim = InMemorySimulator::running();
    let sink = RecordingSink::new();
    let config = BridgeConfig::default().with_release_on_quit(false);
    let mut session = session_with(&sim, config, altitude_registry(), sink.clone());
    let mut scheduler = RequestScheduler::new();

    scheduler.on_tick(&mut session);
    sim.quit();
    notify(&mut session);
    assert!(session.is_connected());

    assert_eq!(scheduler.on_tick(&mut session), TickOutcome::RequestFailed);
    assert_eq!(sink.count_status("Disconnected"), 2);
}

#[test]
fn test_disconnect_twice_reports_once() {
    let sim = InMemorySimulator::running();
    let sink = RecordingSink::new();
    let mut session = session_with(
        &sim,
        BridgeConfig::default(),
        altitude_registry(),
        sink.clone(),
    );

    session.connect().unwrap();
    session.disconnect();
    session.disconnect();

    assert_eq!(sink.statuses(), vec!["Disconnected".to_string()]);
    let closes = sim.calls().into_iter().filter(|c| *c == SimCall::Close);
    assert_eq!(closes.count(), 1);
}

#[test]
fn test_store_sink_keeps_values_on_unknown_id() {
    let sim = InMemorySimulator::running();
    sim.set_value(PropertyId::new(1), 3500.0);
    let store = Arc::new(TelemetryStore::new());
    let mut session = session_with(
        &sim,
        BridgeConfig::default(),
        altitude_registry(),
        store.clone(),
    );
    let mut scheduler = RequestScheduler::new();

    scheduler.on_tick(&mut session);
    scheduler.on_tick(&mut session);
    notify(&mut session);

    let before = store.latest(PropertyId::new(1)).unwrap();
    assert_eq!(before.text, "3500");
    assert_eq!(store.status().as_deref(), Some("Connected"));
    assert_eq!(store.unit(PropertyId::new(1)).as_deref(), Some("feet"));

    sim.push_message(InboundMessage::data(
        PropertyId::new(1),
        DataType::Float64.encode(1013.25),
    ));
    sim.push_message(InboundMessage::data(
        PropertyId::new(9),
        DataType::Float64.encode(-1.0),
    ));
    notify(&mut session);

    assert_eq!(store.text(PropertyId::new(1)).as_deref(), Some("1013.25"));
    assert!(store.latest(PropertyId::new(9)).is_none());
    assert_eq!(store.len(), 1);
    assert_eq!(session.stats().messages_dropped, 1);
}

#[test]
fn test_default_aircraft_round() {
    let sim = InMemorySimulator::running();
    let values = [-122.3321, 47.6062, 271.5, 3500.0, 118.25];
    for (id, value) in (1..=5).zip(values) {
        sim.set_value(PropertyId::new(id), value);
    }

    let store = Arc::new(TelemetryStore::new());
    let registry = Arc::new(PropertyRegistry::default_aircraft());
    let mut session = session_with(&sim, BridgeConfig::default(), registry, store.clone());
    let mut scheduler = RequestScheduler::new();

    scheduler.on_tick(&mut session);
    assert_eq!(scheduler.on_tick(&mut session), TickOutcome::Requested(5));
    notify(&mut session);

    let texts: Vec<_> = store.snapshot().into_iter().map(|v| v.text).collect();
    assert_eq!(
        texts,
        vec!["-122.3321", "47.6062", "271.5", "3500", "118.25"]
    );
    assert_eq!(store.unit(PropertyId::new(5)).as_deref(), Some("knots"));
}
