//! Connector and connection traits
//!
//! A [`SimConnector`] opens sessions; a [`SimConnection`] is one open
//! session. Bindings to the native client library implement both. Every
//! call is fire-and-forget: results come back later as
//! [`InboundMessage`]s drained with [`SimConnection::drain_messages`].

use crate::error::Result;
use crate::message::InboundMessage;
use crate::types::{DataType, HostWindow, ObjectSelector, PropertyId};

/// Opens connections to a running simulator.
pub trait SimConnector {
    /// Connection type produced by this connector
    type Connection: SimConnection;

    /// Perform the handshake.
    ///
    /// `notification_code` is the platform message the simulator posts to
    /// `host_window` whenever inbound messages are waiting.
    fn open(
        &self,
        name: &str,
        host_window: HostWindow,
        notification_code: u32,
    ) -> Result<Self::Connection>;
}

/// One open session with the simulator.
pub trait SimConnection {
    /// Add a field to the data definition `definition`.
    fn declare_data_layout(
        &mut self,
        definition: PropertyId,
        field_name: &str,
        unit: &str,
        data_type: DataType,
    ) -> Result<()>;

    /// Bind a decoder so responses for `definition` arrive as `data_type`
    /// elements instead of raw words.
    fn bind_decoder(&mut self, definition: PropertyId, data_type: DataType) -> Result<()>;

    /// Ask for the current value of `definition` once, answered under
    /// `request`.
    fn request_data_on_sim_object_type(
        &mut self,
        definition: PropertyId,
        request: PropertyId,
        selector: ObjectSelector,
    ) -> Result<()>;

    /// Retrieve every message currently queued for this connection.
    fn drain_messages(&mut self) -> Result<Vec<InboundMessage>>;

    /// Release the connection. Calling it twice is harmless.
    fn close(&mut self);
}
