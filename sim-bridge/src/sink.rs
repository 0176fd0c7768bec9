//! Presentation sink
//!
//! The display side of the bridge. The core writes status text and value
//! text into it and never reads anything back.

use sim_api::PropertyId;
use telemetry_store::TelemetryStore;

/// Connection status shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionStatus {
    /// The simulator acknowledged the session
    Connected,
    /// The session ended or was torn down
    Disconnected,
    /// A connection attempt was refused
    Unavailable,
}

impl ConnectionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionStatus::Connected => "Connected",
            ConnectionStatus::Disconnected => "Disconnected",
            ConnectionStatus::Unavailable => "Simulator not available",
        }
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receiver of everything the bridge displays.
///
/// Implementations must not fail and should return quickly; they are called
/// from the bridge's event loop.
#[cfg_attr(test, mockall::automock)]
pub trait PresentationSink: Send + Sync {
    /// Show the connection status text
    fn set_status(&self, status: &str);

    /// Show the latest value text of a property
    fn set_value(&self, property_id: PropertyId, text: &str);

    /// Show the unit label of a property. Called once per property on every
    /// successful registration.
    fn set_unit(&self, _property_id: PropertyId, _unit: &str) {}
}

impl PresentationSink for TelemetryStore {
    fn set_status(&self, status: &str) {
        self.set_status_text(status);
    }

    fn set_value(&self, property_id: PropertyId, text: &str) {
        match text.parse::<f64>() {
            Ok(value) => self.record(property_id, value, text),
            Err(_) => tracing::warn!(%property_id, text, "Ignoring non-numeric value text"),
        }
    }

    fn set_unit(&self, property_id: PropertyId, unit: &str) {
        self.set_unit_label(property_id, unit);
    }
}
