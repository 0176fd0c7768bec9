//! The bridge loop driven by host events, in paused tokio time and on its
//! own thread.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use helpers::{altitude_registry, RecordingSink};
use sim_api::memory::InMemorySimulator;
use sim_bridge::{
    spawn_bridge, BridgeConfig, HostEvent, HostWindow, PropertyId, PropertyRegistry,
    TelemetryBridge, DEFAULT_NOTIFICATION_CODE,
};
use telemetry_store::{ChangeKind, TelemetryStore};
use tokio::sync::mpsc;

#[tokio::test(start_paused = true)]
async fn test_loop_polls_and_routes() {
    let sim = InMemorySimulator::running();
    sim.set_value(PropertyId::new(1), 3500.0);
    let sink = RecordingSink::new();
    let (tx, rx) = mpsc::unbounded_channel();

    let loop_sim = sim.clone();
    let loop_sink = sink.clone();
    let task = tokio::spawn(async move {
        let mut bridge = TelemetryBridge::new(
            loop_sim,
            BridgeConfig::default(),
            altitude_registry(),
            loop_sink,
        )
        .unwrap();
        bridge.run(rx).await;
        bridge.session().stats()
    });

    tx.send(HostEvent::WindowReady(HostWindow::from_raw(42)))
        .unwrap();
    tx.send(HostEvent::PlatformMessage(DEFAULT_NOTIFICATION_CODE))
        .unwrap();

    // First tick lands one poll interval after the window is ready
    tokio::time::sleep(Duration::from_millis(1500)).await;
    tx.send(HostEvent::PlatformMessage(DEFAULT_NOTIFICATION_CODE))
        .unwrap();
    tx.send(HostEvent::PlatformMessage(0x0113)).unwrap();
    tx.send(HostEvent::WindowClosing).unwrap();

    let stats = task.await.unwrap();

    assert_eq!(stats.connects, 1);
    assert_eq!(stats.requests_issued, 1);
    assert_eq!(
        sink.values(),
        vec![(PropertyId::new(1), "3500".to_string())]
    );
    assert_eq!(
        sink.statuses(),
        vec!["Connected".to_string(), "Disconnected".to_string()]
    );
    assert!(!sim.is_session_open());
}

#[tokio::test(start_paused = true)]
async fn test_loop_keeps_retrying_unavailable_simulator() {
    let sim = InMemorySimulator::new();
    let sink = RecordingSink::new();
    let (tx, rx) = mpsc::unbounded_channel();

    let loop_sim = sim.clone();
    let loop_sink = sink.clone();
    let task = tokio::spawn(async move {
        let mut bridge = TelemetryBridge::new(
            loop_sim,
            BridgeConfig::default(),
            altitude_registry(),
            loop_sink,
        )
        .unwrap();
        bridge.run(rx).await;
    });

    tx.send(HostEvent::WindowReady(HostWindow::NONE)).unwrap();
    tokio::time::sleep(Duration::from_millis(4500)).await;
    drop(tx);
    task.await.unwrap();

    // One attempt when the window became ready, then one per tick
    assert_eq!(sim.open_attempts(), 5);
    assert_eq!(sink.count_status("Simulator not available"), 5);
}

#[test]
fn test_spawned_bridge_feeds_store() {
    let sim = InMemorySimulator::running();
    sim.set_value(PropertyId::new(4), 3500.0);

    let store = Arc::new(TelemetryStore::new());
    store.watch(PropertyId::new(4));

    let handle = spawn_bridge(
        sim.clone(),
        BridgeConfig::default().with_poll_interval(Duration::from_millis(20)),
        Arc::new(PropertyRegistry::default_aircraft()),
        store.clone(),
    )
    .unwrap();

    handle.window_ready(HostWindow::NONE).unwrap();

    // The host forwards notifications as they arrive; keep pumping until the
    // first reading lands
    let changes = store.iter();
    let mut event = None;
    for _ in 0..100 {
        handle.notify(DEFAULT_NOTIFICATION_CODE).unwrap();
        event = changes.recv_timeout(Duration::from_millis(20));
        if event.is_some() {
            break;
        }
    }

    handle.window_closing().unwrap();
    handle.join().unwrap();

    assert_eq!(
        event.map(|e| e.kind),
        Some(ChangeKind::Value(PropertyId::new(4)))
    );
    assert_eq!(store.text(PropertyId::new(4)).as_deref(), Some("3500"));
    assert_eq!(store.status().as_deref(), Some("Disconnected"));
    assert!(!sim.is_session_open());
}

#[test]
fn test_spawn_rejects_invalid_config() {
    let result = spawn_bridge(
        InMemorySimulator::running(),
        BridgeConfig::default().with_app_name(""),
        altitude_registry(),
        RecordingSink::new(),
    );
    assert!(matches!(result, Err(sim_bridge::BridgeError::Config(_))));
}

#[test]
fn test_stopped_bridge_rejects_events() {
    let handle = spawn_bridge(
        InMemorySimulator::running(),
        BridgeConfig::default(),
        altitude_registry(),
        RecordingSink::new(),
    )
    .unwrap();

    let sender = handle.sender();
    handle.window_closing().unwrap();
    handle.join().unwrap();

    assert!(sender
        .send(HostEvent::WindowReady(HostWindow::NONE))
        .is_err());
}
