//! Inbound messages delivered by the simulator.

use bytes::Bytes;

use crate::types::PropertyId;

/// Handshake details sent by the simulator once a connection is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OpenInfo {
    /// Name of the simulator application
    pub application_name: String,
    /// Application version (major, minor)
    pub application_version: (u32, u32),
    /// Version of the client API the simulator speaks (major, minor)
    pub api_version: (u32, u32),
}

/// A message drained from an open connection.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// The simulator acknowledged the connection
    Open(OpenInfo),

    /// The simulator is shutting down the session
    Quit,

    /// Response to a data request for objects of a given type
    SimObjectDataByType {
        /// Request id the response answers
        request_id: PropertyId,
        /// Simulator-side id of the object the data belongs to
        object_id: u32,
        /// Data definition the payload is laid out by
        define_id: PropertyId,
        /// Raw payload, laid out according to the bound decoder
        payload: Bytes,
    },

    /// The simulator rejected an earlier call
    Exception {
        /// Native exception code
        exception: u32,
        /// Send id of the call that caused it
        send_id: u32,
        /// Index of the offending parameter, if known
        index: u32,
    },
}

impl InboundMessage {
    /// Short name of the message kind, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            InboundMessage::Open(_) => "open",
            InboundMessage::Quit => "quit",
            InboundMessage::SimObjectDataByType { .. } => "data_by_type",
            InboundMessage::Exception { .. } => "exception",
        }
    }

    /// Build a data response for the user object where the definition and
    /// request share one id.
    pub fn data(id: PropertyId, payload: Bytes) -> Self {
        InboundMessage::SimObjectDataByType {
            request_id: id,
            object_id: 1,
            define_id: id,
            payload,
        }
    }
}
