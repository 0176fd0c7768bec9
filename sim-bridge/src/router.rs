//! Response routing
//!
//! Turns each inbound message into at most one sink call. Data responses are
//! demultiplexed by request id, which is also the property id; responses for
//! ids outside the registry are dropped.

use std::sync::Arc;

use sim_api::{InboundMessage, PropertyId};
use tracing::{debug, info, trace, warn};

use crate::decode::{decode_first, format_value};
use crate::error::DecodeError;
use crate::registry::PropertyRegistry;
use crate::sink::{ConnectionStatus, PresentationSink};

/// Why a message produced no sink call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// The request id is not in the registry
    UnknownProperty(PropertyId),
    /// The payload could not be decoded
    Decode {
        property_id: PropertyId,
        error: DecodeError,
    },
}

/// Result of routing one message
#[derive(Debug, Clone, PartialEq)]
pub enum RouteOutcome {
    /// Handshake acknowledged; status set to connected
    Opened,
    /// Simulator is closing the session; status set to disconnected
    Quit,
    /// A value was forwarded to the sink
    Delivered { property_id: PropertyId, value: f64 },
    /// The simulator rejected an earlier call
    Exception { exception: u32, send_id: u32 },
    /// Nothing was forwarded
    Dropped(DropReason),
}

/// Routes inbound messages to the presentation sink.
pub struct ResponseRouter {
    registry: Arc<PropertyRegistry>,
    sink: Arc<dyn PresentationSink>,
}

impl ResponseRouter {
    pub fn new(registry: Arc<PropertyRegistry>, sink: Arc<dyn PresentationSink>) -> Self {
        Self { registry, sink }
    }

    /// Route a single message. Never panics and never fails; malformed input
    /// is reported as [`RouteOutcome::Dropped`].
    pub fn route(&self, message: &InboundMessage) -> RouteOutcome {
        match message {
            InboundMessage::Open(info) => {
                info!(
                    application = %info.application_name,
                    version = ?info.application_version,
                    api_version = ?info.api_version,
                    "Simulator acknowledged connection"
                );
                self.sink.set_status(ConnectionStatus::Connected.as_str());
                RouteOutcome::Opened
            }
            InboundMessage::Quit => {
                info!("Simulator closed the session");
                self.sink
                    .set_status(ConnectionStatus::Disconnected.as_str());
                RouteOutcome::Quit
            }
            InboundMessage::SimObjectDataByType {
                request_id,
                define_id,
                payload,
                ..
            } => {
                if define_id != request_id {
                    trace!(%request_id, %define_id, "Definition id differs from request id");
                }
                self.route_data(*request_id, payload)
            }
            InboundMessage::Exception {
                exception,
                send_id,
                index,
            } => {
                warn!(exception, send_id, index, "Simulator rejected a call");
                RouteOutcome::Exception {
                    exception: *exception,
                    send_id: *send_id,
                }
            }
        }
    }

    fn route_data(&self, request_id: PropertyId, payload: &[u8]) -> RouteOutcome {
        let Some(property) = self.registry.get(request_id) else {
            debug!(%request_id, "Dropping response for unknown property");
            return RouteOutcome::Dropped(DropReason::UnknownProperty(request_id));
        };

        match decode_first(payload, property.data_type) {
            Ok(value) => {
                trace!(property = %property.field_name, value, "Routing value");
                self.sink.set_value(property.id, &format_value(value));
                RouteOutcome::Delivered {
                    property_id: property.id,
                    value,
                }
            }
            Err(error) => {
                warn!(property = %property.field_name, %error, "Dropping undecodable response");
                RouteOutcome::Dropped(DropReason::Decode {
                    property_id: property.id,
                    error,
                })
            }
        }
    }
}

impl std::fmt::Debug for ResponseRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseRouter")
            .field("tracked", &self.registry.len())
            .finish()
    }
}
