//! Flight simulator data-exchange API contract
//!
//! This crate describes the surface of a simulator's client data API in
//! Rust types. It does not implement the wire protocol: that belongs to the
//! simulator process and its native client library. Bridges are written
//! against the [`SimConnector`] and [`SimConnection`] traits, and a concrete
//! binding to the native library plugs in underneath.
//!
//! # Session shape
//!
//! ```rust,ignore
//! use sim_api::{DataType, HostWindow, ObjectSelector, PropertyId, SimConnection, SimConnector};
//!
//! let mut conn = connector.open("simlink", HostWindow::NONE, 0x0402)?;
//!
//! // Declare what a definition looks like and how to decode it
//! let altitude = PropertyId::new(4);
//! conn.declare_data_layout(altitude, "PLANE ALTITUDE", "feet", DataType::Float64)?;
//! conn.bind_decoder(altitude, DataType::Float64)?;
//!
//! // Ask for the current value; the answer arrives later as an inbound message
//! conn.request_data_on_sim_object_type(altitude, altitude, ObjectSelector::user())?;
//!
//! for message in conn.drain_messages()? {
//!     println!("{:?}", message);
//! }
//!
//! conn.close();
//! ```
//!
//! The simulator never pushes messages on its own schedule. It raises a
//! platform notification on the window handed to [`SimConnector::open`] and
//! waits for the host to call [`SimConnection::drain_messages`].

pub mod connection;
pub mod error;
pub mod message;
pub mod types;

#[cfg(feature = "test-support")]
pub mod memory;

pub use connection::{SimConnection, SimConnector};
pub use error::{ApiError, Result};
pub use message::{InboundMessage, OpenInfo};
pub use types::{DataType, HostWindow, ObjectSelector, PropertyId, SimObjectKind};
