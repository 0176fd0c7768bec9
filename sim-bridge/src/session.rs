//! Session management
//!
//! The [`SessionManager`] owns the one connection handle the bridge holds.
//! It is either `Disconnected` (no handle) or `Connected` (handle held and
//! every tracked property registered on it). Any failed call on the handle
//! drops straight back to `Disconnected`; nothing is retried inside a call.

use std::sync::Arc;

use serde::Serialize;
use sim_api::{HostWindow, SimConnection, SimConnector};
use tracing::{debug, info, warn};

use crate::config::BridgeConfig;
use crate::error::{ConnectError, ProtocolError, SessionError};
use crate::registry::PropertyRegistry;
use crate::router::{ResponseRouter, RouteOutcome};
use crate::scheduler::{issue_requests, register_all};
use crate::sink::{ConnectionStatus, PresentationSink};

/// Connection state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SessionState {
    Disconnected,
    Connected,
}

/// Counters kept for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    /// Calls to `open`, successful or not
    pub connect_attempts: u64,
    /// Successful handshakes
    pub connects: u64,
    /// Completed registration passes
    pub registrations: u64,
    /// Data requests issued
    pub requests_issued: u64,
    /// Inbound messages handed to the router
    pub messages_routed: u64,
    /// Routed messages that produced no sink call
    pub messages_dropped: u64,
}

/// Owns the connection lifecycle.
pub struct SessionManager<C: SimConnector> {
    connector: C,
    config: BridgeConfig,
    registry: Arc<PropertyRegistry>,
    router: ResponseRouter,
    sink: Arc<dyn PresentationSink>,
    host_window: HostWindow,
    connection: Option<C::Connection>,
    stats: SessionStats,
}

impl<C: SimConnector> SessionManager<C> {
    pub fn new(
        connector: C,
        config: BridgeConfig,
        registry: Arc<PropertyRegistry>,
        sink: Arc<dyn PresentationSink>,
    ) -> Self {
        let router = ResponseRouter::new(Arc::clone(&registry), Arc::clone(&sink));
        Self {
            connector,
            config,
            registry,
            router,
            sink,
            host_window: HostWindow::NONE,
            connection: None,
            stats: SessionStats::default(),
        }
    }

    /// Window that receives the "messages waiting" notification. Takes
    /// effect on the next connect.
    pub fn set_host_window(&mut self, host_window: HostWindow) {
        self.host_window = host_window;
    }

    pub fn host_window(&self) -> HostWindow {
        self.host_window
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<PropertyRegistry> {
        &self.registry
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub fn state(&self) -> SessionState {
        if self.is_connected() {
            SessionState::Connected
        } else {
            SessionState::Disconnected
        }
    }

    /// Open a connection and register every tracked property on it.
    ///
    /// A refused handshake is reported to the sink as
    /// [`ConnectionStatus::Unavailable`] and returned as
    /// [`SessionError::Connect`]. A registration failure tears the new
    /// connection down again and is returned as [`SessionError::Protocol`].
    /// Does nothing when already connected.
    pub fn connect(&mut self) -> Result<(), SessionError> {
        if self.is_connected() {
            return Ok(());
        }

        self.stats.connect_attempts += 1;
        let opened = self.connector.open(
            &self.config.app_name,
            self.host_window,
            self.config.notification_code,
        );

        let mut connection = match opened {
            Ok(connection) => connection,
            Err(error) => {
                let error = ConnectError::from(error);
                debug!(%error, attempt = self.stats.connect_attempts, "Connect attempt failed");
                self.sink.set_status(ConnectionStatus::Unavailable.as_str());
                return Err(error.into());
            }
        };

        self.stats.connects += 1;
        info!(app_name = %self.config.app_name, "Connected to simulator");

        let registered = register_all(&mut connection, &self.registry, self.sink.as_ref());
        self.connection = Some(connection);

        match registered {
            Ok(count) => {
                self.stats.registrations += 1;
                info!(properties = count, "Registered tracked properties");
                Ok(())
            }
            Err(error) => {
                warn!(%error, "Registration failed, disconnecting");
                self.disconnect();
                Err(error.into())
            }
        }
    }

    /// Close the connection if one is held.
    ///
    /// The sink is told `Disconnected` only when a handle was actually
    /// released, so calling this repeatedly is harmless.
    pub fn disconnect(&mut self) {
        if self.release() {
            self.sink
                .set_status(ConnectionStatus::Disconnected.as_str());
        }
    }

    /// Drain every waiting inbound message and route it.
    ///
    /// Returns the number of messages routed; `Ok(0)` when disconnected. A
    /// failed drain disconnects the session.
    pub fn receive_pending(&mut self) -> Result<usize, SessionError> {
        let Some(connection) = self.connection.as_mut() else {
            return Ok(0);
        };

        let messages = match connection.drain_messages() {
            Ok(messages) => messages,
            Err(source) => {
                let error = ProtocolError::Drain(source);
                warn!(%error, "Disconnecting");
                self.disconnect();
                return Err(error.into());
            }
        };

        let mut quit = false;
        for message in &messages {
            debug!(kind = message.kind(), "Routing inbound message");
            match self.router.route(message) {
                RouteOutcome::Quit => quit = true,
                RouteOutcome::Dropped(_) => self.stats.messages_dropped += 1,
                _ => {}
            }
        }
        self.stats.messages_routed += messages.len() as u64;

        // The router already reported the quit, so release without a second
        // status update
        if quit && self.config.release_on_quit {
            self.release();
        }

        Ok(messages.len())
    }

    /// Issue one data request per tracked property.
    ///
    /// Returns the number issued; `Ok(0)` when disconnected. The first
    /// failure disconnects the session and skips the remaining requests.
    pub fn request_all(&mut self) -> Result<usize, SessionError> {
        let Some(connection) = self.connection.as_mut() else {
            return Ok(0);
        };

        match issue_requests(connection, &self.registry, self.config.object_selector) {
            Ok(count) => {
                self.stats.requests_issued += count as u64;
                Ok(count)
            }
            Err(error) => {
                warn!(%error, "Request failed, disconnecting");
                self.disconnect();
                Err(error.into())
            }
        }
    }

    /// Close and forget the handle. Returns whether one was held.
    fn release(&mut self) -> bool {
        match self.connection.take() {
            Some(mut connection) => {
                connection.close();
                info!("Released simulator connection");
                true
            }
            None => false,
        }
    }
}

impl<C: SimConnector> Drop for SessionManager<C> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<C: SimConnector> std::fmt::Debug for SessionManager<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("state", &self.state())
            .field("host_window", &self.host_window)
            .field("stats", &self.stats)
            .finish()
    }
}
