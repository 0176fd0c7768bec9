//! Core types shared by the simulator API and its clients.

use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

/// Identifier of a tracked property.
///
/// The same value is used as the data-definition id when declaring a layout
/// and as the request id when asking for data, so an inbound response can be
/// matched back to its property by request id alone.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyId(pub u32);

impl PropertyId {
    /// Create a new property ID.
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw identifier.
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for PropertyId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for PropertyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Numeric encoding of a declared data field.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// 32-bit signed integer
    Int32,
    /// 64-bit signed integer
    Int64,
    /// 32-bit IEEE float
    Float32,
    /// 64-bit IEEE float
    #[default]
    Float64,
}

impl DataType {
    /// Size of one encoded element in bytes.
    pub const fn size(self) -> usize {
        match self {
            DataType::Int32 | DataType::Float32 => 4,
            DataType::Int64 | DataType::Float64 => 8,
        }
    }

    /// Encode a single value as a little-endian payload element.
    ///
    /// Integer encodings truncate toward zero.
    pub fn encode(self, value: f64) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.size());
        match self {
            DataType::Int32 => buf.put_i32_le(value as i32),
            DataType::Int64 => buf.put_i64_le(value as i64),
            DataType::Float32 => buf.put_f32_le(value as f32),
            DataType::Float64 => buf.put_f64_le(value),
        }
        buf.freeze()
    }
}

/// Kind of simulated object a request targets.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimObjectKind {
    /// The aircraft under the user's control
    User,
    /// Any kind of object
    All,
    /// AI or multiplayer aircraft
    Aircraft,
    /// Helicopters
    Helicopter,
    /// Boats
    Boat,
    /// Ground vehicles
    Ground,
}

/// Selects which simulated object(s) a request is answered for.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct ObjectSelector {
    /// Kind of object
    pub kind: SimObjectKind,
    /// Search radius around the user aircraft; 0 means the user object only
    pub radius_meters: u32,
}

impl ObjectSelector {
    /// The user-controlled aircraft, radius 0.
    pub const fn user() -> Self {
        Self {
            kind: SimObjectKind::User,
            radius_meters: 0,
        }
    }
}

impl Default for ObjectSelector {
    fn default() -> Self {
        Self::user()
    }
}

/// Native handle of the host window that receives the "messages waiting"
/// notification.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Default)]
pub struct HostWindow(pub usize);

impl HostWindow {
    /// No window; valid for hosts that poll instead of receiving notifications.
    pub const NONE: HostWindow = HostWindow(0);

    /// Wrap a raw native handle.
    pub const fn from_raw(raw: usize) -> Self {
        Self(raw)
    }

    /// Get the raw native handle.
    pub const fn as_raw(self) -> usize {
        self.0
    }
}
