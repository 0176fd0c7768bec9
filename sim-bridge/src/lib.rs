//! # simlink bridge
//!
//! Keeps a live view of a running flight simulator's telemetry. The bridge
//! connects to the simulator's data API, registers a fixed set of
//! properties, polls them on a fixed cadence and routes every response into
//! a [`PresentationSink`].
//!
//! ## Components
//!
//! - [`PropertyRegistry`]: what is tracked, keyed by [`PropertyId`]
//! - [`SessionManager`]: connect, register, disconnect
//! - [`RequestScheduler`]: one connect attempt or one request round per tick
//! - [`ResponseRouter`]: inbound message to sink call
//! - [`MessagePumpAdapter`]: platform notification to drain
//! - [`TelemetryBridge`]: the event loop tying them together
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sim_bridge::prelude::*;
//! use telemetry_store::TelemetryStore;
//!
//! let store = Arc::new(TelemetryStore::new());
//! let registry = Arc::new(PropertyRegistry::default_aircraft());
//!
//! let handle = spawn_bridge(connector, BridgeConfig::default(), registry, store.clone())?;
//! handle.window_ready(host_window)?;
//!
//! // From the host window procedure
//! handle.notify(message_code)?;
//!
//! // Read the latest values from any thread
//! if let Some(altitude) = store.latest(PropertyId::new(4)) {
//!     println!("Altitude: {} feet", altitude.text);
//! }
//!
//! handle.window_closing()?;
//! handle.join()?;
//! ```
//!
//! Connection status reaches the sink as text: `Connected`, `Disconnected`
//! or `Simulator not available`. A refused connection is retried on every
//! tick without backoff.

pub mod bridge;
pub mod config;
pub mod decode;
pub mod error;
pub mod logging;
pub mod pump;
pub mod registry;
pub mod router;
pub mod scheduler;
pub mod session;
pub mod sink;

pub use bridge::{spawn_bridge, BridgeHandle, HostEvent, LoopControl, TelemetryBridge};
pub use config::{BridgeConfig, BridgeSettings, DEFAULT_APP_NAME, DEFAULT_NOTIFICATION_CODE};
pub use error::{
    BridgeError, ConfigError, ConnectError, DecodeError, ProtocolError, Result, SessionError,
};
pub use logging::{init_logging, init_logging_from_env, LoggingError, LoggingMode};
pub use pump::MessagePumpAdapter;
pub use registry::{PropertyRegistry, TrackedProperty};
pub use router::{DropReason, ResponseRouter, RouteOutcome};
pub use scheduler::{RequestScheduler, TickOutcome};
pub use session::{SessionManager, SessionState, SessionStats};
pub use sink::{ConnectionStatus, PresentationSink};

pub use sim_api::{DataType, HostWindow, InboundMessage, PropertyId};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        spawn_bridge, BridgeConfig, BridgeHandle, BridgeSettings, ConnectionStatus, HostEvent,
        HostWindow, PresentationSink, PropertyId, PropertyRegistry, SessionManager,
        TelemetryBridge, TrackedProperty,
    };
}
