//! Error types for the sim-bridge crate.

use sim_api::{ApiError, PropertyId};
use thiserror::Error;

use crate::logging::LoggingError;

/// The simulator refused the handshake.
///
/// Reported to the presentation sink and retried on the next tick.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Failed to connect to simulator: {0}")]
pub struct ConnectError(#[from] pub ApiError);

/// A call on an open connection failed.
///
/// Any of these forces the session to disconnect.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Declaring the data layout of a property failed
    #[error("Failed to declare data layout for property {property}: {source}")]
    DeclareLayout {
        property: PropertyId,
        #[source]
        source: ApiError,
    },

    /// Binding the payload decoder of a property failed
    #[error("Failed to bind decoder for property {property}: {source}")]
    BindDecoder {
        property: PropertyId,
        #[source]
        source: ApiError,
    },

    /// Issuing a data request failed
    #[error("Failed to request data for property {property}: {source}")]
    Request {
        property: PropertyId,
        #[source]
        source: ApiError,
    },

    /// Draining inbound messages failed
    #[error("Failed to drain inbound messages: {0}")]
    Drain(#[source] ApiError),
}

/// A data payload could not be decoded. Only the message is dropped.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Payload too short: expected {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },

    #[error("Decoded value is not finite")]
    NonFinite,
}

/// Errors returned by session operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Invalid registry or bridge configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Property id {0} is registered more than once")]
    DuplicateProperty(PropertyId),

    #[error("Property id 0 is reserved")]
    ReservedPropertyId,

    #[error("Property {0} has an empty field name")]
    EmptyFieldName(PropertyId),

    #[error("Invalid property entry '{0}': expected \"FIELD NAME,unit\"")]
    InvalidCompactEntry(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}

/// Top-level errors of the bridge.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),

    #[error("Bridge has stopped")]
    Stopped,

    #[error("Bridge worker panicked")]
    WorkerPanicked,
}

/// Convenience type alias for Results using BridgeError.
pub type Result<T> = std::result::Result<T, BridgeError>;
