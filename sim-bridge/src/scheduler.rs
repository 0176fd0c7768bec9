//! Request scheduling
//!
//! The scheduler drives the session from the poll timer. A disconnected
//! session gets one connect attempt per tick; a connected one gets one data
//! request per tracked property. Responses are not awaited here, they arrive
//! later through the message pump.
//!
//! The registration step that follows every successful connect lives here
//! too, since it walks the registry the same way request issuance does.

use sim_api::{ObjectSelector, SimConnection, SimConnector};
use tracing::{debug, trace, warn};

use crate::error::{ProtocolError, SessionError};
use crate::registry::PropertyRegistry;
use crate::session::SessionManager;
use crate::sink::PresentationSink;

/// What a single tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The session connected and registered every property
    Connected,
    /// The connect attempt or the registration that follows it failed
    ConnectFailed,
    /// This many requests were issued
    Requested(usize),
    /// A request failed and the session was torn down
    RequestFailed,
}

/// Polls the session on a fixed cadence.
#[derive(Debug, Default)]
pub struct RequestScheduler {
    ticks: u64,
}

impl RequestScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of ticks handled so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Handle one poll-timer tick.
    ///
    /// Never fails; every error is either reported to the sink by the session
    /// or ends in a disconnect.
    pub fn on_tick<C: SimConnector>(&mut self, session: &mut SessionManager<C>) -> TickOutcome {
        self.ticks += 1;
        trace!(tick = self.ticks, "Scheduler tick");

        if !session.is_connected() {
            return match session.connect() {
                Ok(()) => TickOutcome::Connected,
                Err(SessionError::Connect(error)) => {
                    debug!(%error, "Simulator unavailable, retrying next tick");
                    TickOutcome::ConnectFailed
                }
                Err(SessionError::Protocol(error)) => {
                    warn!(%error, "Registration failed, retrying next tick");
                    TickOutcome::ConnectFailed
                }
            };
        }

        match session.request_all() {
            Ok(count) => TickOutcome::Requested(count),
            Err(_) => TickOutcome::RequestFailed,
        }
    }
}

/// Declare and bind every tracked property on a fresh connection, in
/// registry order. Each property's unit label is handed to the sink once its
/// layout is in place.
///
/// Stops at the first failure; the caller tears the connection down.
pub(crate) fn register_all<C: SimConnection>(
    connection: &mut C,
    registry: &PropertyRegistry,
    sink: &dyn PresentationSink,
) -> Result<usize, ProtocolError> {
    for property in registry {
        connection
            .declare_data_layout(
                property.id,
                &property.field_name,
                &property.unit,
                property.data_type,
            )
            .map_err(|source| ProtocolError::DeclareLayout {
                property: property.id,
                source,
            })?;

        connection
            .bind_decoder(property.id, property.data_type)
            .map_err(|source| ProtocolError::BindDecoder {
                property: property.id,
                source,
            })?;

        sink.set_unit(property.id, &property.unit);
        trace!(property = %property.field_name, id = %property.id, "Registered property");
    }

    Ok(registry.len())
}

/// Issue one request per tracked property, in registry order. The property
/// id doubles as definition id and request id.
///
/// The first failure aborts the remaining requests.
pub(crate) fn issue_requests<C: SimConnection>(
    connection: &mut C,
    registry: &PropertyRegistry,
    selector: ObjectSelector,
) -> Result<usize, ProtocolError> {
    for property in registry {
        connection
            .request_data_on_sim_object_type(property.id, property.id, selector)
            .map_err(|source| ProtocolError::Request {
                property: property.id,
                source,
            })?;
    }

    Ok(registry.len())
}
