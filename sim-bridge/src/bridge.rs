//! Bridge event loop
//!
//! One cooperative loop multiplexes the poll timer with events from the
//! host window. Scheduler ticks and message drains therefore never run
//! concurrently, and the session needs no locking.
//!
//! Hosts that do not run tokio themselves use [`spawn_bridge`], which runs
//! the loop on a dedicated thread with its own current-thread runtime and
//! hands back a sync [`BridgeHandle`].

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use sim_api::{HostWindow, SimConnector};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::{BridgeConfig, BridgeSettings};
use crate::error::{BridgeError, ConfigError};
use crate::pump::MessagePumpAdapter;
use crate::registry::PropertyRegistry;
use crate::scheduler::{RequestScheduler, TickOutcome};
use crate::session::SessionManager;
use crate::sink::PresentationSink;

/// Events delivered by the host window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    /// The window exists and can receive notifications; polling starts
    WindowReady(HostWindow),
    /// A platform message arrived on the window
    PlatformMessage(u32),
    /// The window is going away; the bridge disconnects and stops
    WindowClosing,
}

/// What the loop should do after an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    /// Polling was just started; the next tick is one interval away
    PollingStarted,
    Stop,
}

/// Session, scheduler and message pump wired together.
pub struct TelemetryBridge<C: SimConnector> {
    session: SessionManager<C>,
    scheduler: RequestScheduler,
    pump: MessagePumpAdapter,
    poll_interval: Duration,
    polling: bool,
}

impl<C: SimConnector> TelemetryBridge<C> {
    /// Create a bridge. Fails if `config` does not validate.
    pub fn new(
        connector: C,
        config: BridgeConfig,
        registry: Arc<PropertyRegistry>,
        sink: Arc<dyn PresentationSink>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let pump = MessagePumpAdapter::new(config.notification_code);
        let poll_interval = config.poll_interval;

        Ok(Self {
            session: SessionManager::new(connector, config, registry, sink),
            scheduler: RequestScheduler::new(),
            pump,
            poll_interval,
            polling: false,
        })
    }

    pub fn from_settings(
        connector: C,
        settings: BridgeSettings,
        sink: Arc<dyn PresentationSink>,
    ) -> Result<Self, ConfigError> {
        Self::new(
            connector,
            settings.config,
            Arc::new(settings.registry),
            sink,
        )
    }

    pub fn session(&self) -> &SessionManager<C> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionManager<C> {
        &mut self.session
    }

    pub fn scheduler(&self) -> &RequestScheduler {
        &self.scheduler
    }

    /// Whether the poll timer is running
    pub fn is_polling(&self) -> bool {
        self.polling
    }

    /// Apply one host event.
    pub fn handle_event(&mut self, event: HostEvent) -> LoopControl {
        match event {
            HostEvent::WindowReady(host_window) => {
                info!(?host_window, "Host window ready, starting polling");
                self.session.set_host_window(host_window);
                self.polling = true;
                if let Err(error) = self.session.connect() {
                    debug!(%error, "Initial connect failed");
                }
                LoopControl::PollingStarted
            }
            HostEvent::PlatformMessage(code) => {
                if !self.pump.on_platform_message(code, &mut self.session) {
                    debug!(code, "Ignoring unrelated platform message");
                }
                LoopControl::Continue
            }
            HostEvent::WindowClosing => {
                info!("Host window closing");
                self.polling = false;
                self.session.disconnect();
                LoopControl::Stop
            }
        }
    }

    /// Run one scheduler tick.
    pub fn tick(&mut self) -> TickOutcome {
        self.scheduler.on_tick(&mut self.session)
    }

    /// Run until the host closes the window or drops its sender.
    pub async fn run(&mut self, mut host_rx: mpsc::UnboundedReceiver<HostEvent>) {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(poll_interval = ?self.poll_interval, "Bridge loop started");

        loop {
            tokio::select! {
                _ = interval.tick(), if self.polling => {
                    let outcome = self.tick();
                    debug!(?outcome, "Tick handled");
                }

                event = host_rx.recv() => {
                    match event {
                        Some(event) => match self.handle_event(event) {
                            LoopControl::Continue => {}
                            LoopControl::PollingStarted => interval.reset(),
                            LoopControl::Stop => break,
                        },
                        None => {
                            info!("Host event channel closed");
                            self.polling = false;
                            self.session.disconnect();
                            break;
                        }
                    }
                }
            }
        }

        info!("Bridge loop stopped");
    }
}

impl<C: SimConnector> std::fmt::Debug for TelemetryBridge<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryBridge")
            .field("session", &self.session)
            .field("scheduler", &self.scheduler)
            .field("poll_interval", &self.poll_interval)
            .field("polling", &self.polling)
            .finish()
    }
}

/// Sync handle to a bridge running on its own thread
///
/// Dropping the handle asks the bridge to close but does not wait for it.
#[derive(Debug)]
pub struct BridgeHandle {
    host_tx: mpsc::UnboundedSender<HostEvent>,
    thread: Option<JoinHandle<()>>,
}

impl BridgeHandle {
    /// Deliver an arbitrary host event
    pub fn send(&self, event: HostEvent) -> Result<(), BridgeError> {
        self.host_tx.send(event).map_err(|_| BridgeError::Stopped)
    }

    pub fn window_ready(&self, host_window: HostWindow) -> Result<(), BridgeError> {
        self.send(HostEvent::WindowReady(host_window))
    }

    /// Forward a platform message received by the host window
    pub fn notify(&self, code: u32) -> Result<(), BridgeError> {
        self.send(HostEvent::PlatformMessage(code))
    }

    pub fn window_closing(&self) -> Result<(), BridgeError> {
        self.send(HostEvent::WindowClosing)
    }

    /// A sender for hosts that deliver events from several places
    pub fn sender(&self) -> mpsc::UnboundedSender<HostEvent> {
        self.host_tx.clone()
    }

    /// Wait for the bridge thread to exit. Blocks until the loop stops, so
    /// call [`window_closing`](Self::window_closing) first.
    pub fn join(mut self) -> Result<(), BridgeError> {
        match self.thread.take() {
            Some(thread) => thread.join().map_err(|_| BridgeError::WorkerPanicked),
            None => Ok(()),
        }
    }
}

impl Drop for BridgeHandle {
    fn drop(&mut self) {
        if self.thread.is_some() {
            let _ = self.host_tx.send(HostEvent::WindowClosing);
        }
    }
}

/// Spawn a bridge on a dedicated thread
///
/// The thread owns a current-thread tokio runtime and the session; only the
/// connector has to cross threads.
pub fn spawn_bridge<C>(
    connector: C,
    config: BridgeConfig,
    registry: Arc<PropertyRegistry>,
    sink: Arc<dyn PresentationSink>,
) -> Result<BridgeHandle, BridgeError>
where
    C: SimConnector + Send + 'static,
{
    config.validate()?;

    let (host_tx, host_rx) = mpsc::unbounded_channel();

    let thread = thread::Builder::new()
        .name("simlink-bridge".to_string())
        .spawn(move || {
            let rt = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    tracing::error!("Failed to create tokio runtime for bridge: {}", e);
                    return;
                }
            };

            let mut bridge = match TelemetryBridge::new(connector, config, registry, sink) {
                Ok(bridge) => bridge,
                Err(e) => {
                    tracing::error!("Failed to create bridge: {}", e);
                    return;
                }
            };

            rt.block_on(bridge.run(host_rx));
        })
        .map_err(|e| {
            warn!("Failed to spawn bridge thread: {}", e);
            BridgeError::Stopped
        })?;

    Ok(BridgeHandle {
        host_tx,
        thread: Some(thread),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TrackedProperty;
    use crate::sink::MockPresentationSink;
    use sim_api::memory::{InMemorySimulator, SimCall};
    use sim_api::PropertyId;

    fn registry() -> Arc<PropertyRegistry> {
        Arc::new(
            PropertyRegistry::new(vec![TrackedProperty::new(1, "PLANE ALTITUDE", "feet")])
                .unwrap(),
        )
    }

    fn lenient_sink() -> Arc<MockPresentationSink> {
        let mut sink = MockPresentationSink::new();
        sink.expect_set_unit().return_const(());
        sink.expect_set_value().return_const(());
        sink.expect_set_status().return_const(());
        Arc::new(sink)
    }

    fn bridge(sim: &InMemorySimulator) -> TelemetryBridge<InMemorySimulator> {
        TelemetryBridge::new(
            sim.clone(),
            BridgeConfig::default(),
            registry(),
            lenient_sink(),
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_invalid_config() {
        let sim = InMemorySimulator::running();
        let config = BridgeConfig::default().with_poll_interval(Duration::ZERO);
        let result = TelemetryBridge::new(sim, config, registry(), lenient_sink());
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_from_settings_uses_loaded_config_and_registry() {
        let settings = BridgeSettings::from_json(
            r#"{
                "bridge": {"app_name": "altimeter"},
                "properties": [{"id": 1, "field_name": "PLANE ALTITUDE", "unit": "feet"}]
            }"#,
        )
        .unwrap();
        let sim = InMemorySimulator::running();
        let mut bridge = TelemetryBridge::from_settings(sim.clone(), settings, lenient_sink())
            .unwrap();

        assert_eq!(bridge.tick(), TickOutcome::Connected);
        assert!(matches!(
            &sim.calls()[0],
            SimCall::Open { name, .. } if name == "altimeter"
        ));
        assert_eq!(sim.declared_ids(), vec![PropertyId::new(1)]);
    }

    #[test]
    fn test_window_ready_connects_and_starts_polling() {
        let sim = InMemorySimulator::running();
        let mut bridge = bridge(&sim);
        assert!(!bridge.is_polling());

        let control = bridge.handle_event(HostEvent::WindowReady(HostWindow::from_raw(7)));

        assert_eq!(control, LoopControl::PollingStarted);
        assert!(bridge.is_polling());
        assert!(bridge.session().is_connected());
        assert_eq!(bridge.session().host_window(), HostWindow::from_raw(7));
    }

    #[test]
    fn test_window_ready_without_simulator_still_polls() {
        let sim = InMemorySimulator::new();
        let mut bridge = bridge(&sim);

        bridge.handle_event(HostEvent::WindowReady(HostWindow::NONE));
        assert!(bridge.is_polling());
        assert!(!bridge.session().is_connected());

        sim.set_running(true);
        assert_eq!(bridge.tick(), TickOutcome::Connected);
        assert_eq!(bridge.tick(), TickOutcome::Requested(1));
        assert_eq!(bridge.scheduler().ticks(), 2);
    }

    #[test]
    fn test_window_closing_stops() {
        let sim = InMemorySimulator::running();
        let mut bridge = bridge(&sim);
        bridge.handle_event(HostEvent::WindowReady(HostWindow::NONE));

        assert_eq!(
            bridge.handle_event(HostEvent::WindowClosing),
            LoopControl::Stop
        );
        assert!(!bridge.is_polling());
        assert!(!sim.is_session_open());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_when_channel_closes() {
        let sim = InMemorySimulator::running();
        let mut bridge = bridge(&sim);
        let (tx, rx) = mpsc::unbounded_channel();

        tx.send(HostEvent::WindowReady(HostWindow::NONE)).unwrap();
        drop(tx);

        bridge.run(rx).await;
        assert!(!bridge.session().is_connected());
        assert_eq!(bridge.scheduler().ticks(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_polls_on_interval() {
        let sim = InMemorySimulator::running();
        sim.set_value(PropertyId::new(1), 3500.0);
        let (tx, rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(async move {
            let mut bridge = bridge(&sim);
            bridge.run(rx).await;
            (bridge.scheduler().ticks(), sim.requested_ids())
        });

        tx.send(HostEvent::WindowReady(HostWindow::NONE)).unwrap();
        tokio::time::sleep(Duration::from_millis(3500)).await;
        tx.send(HostEvent::WindowClosing).unwrap();

        let (ticks, requested) = task.await.unwrap();
        assert_eq!(ticks, 3);
        assert_eq!(requested, vec![PropertyId::new(1); 3]);
    }

    #[test]
    fn test_spawned_bridge_round_trip() {
        let sim = InMemorySimulator::running();
        let handle = spawn_bridge(
            sim.clone(),
            BridgeConfig::fast_polling(),
            registry(),
            lenient_sink(),
        )
        .unwrap();

        handle.window_ready(HostWindow::NONE).unwrap();
        handle.window_closing().unwrap();
        handle.join().unwrap();

        assert_eq!(sim.session_count(), 1);
        assert!(!sim.is_session_open());
    }
}
