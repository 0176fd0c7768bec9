//! Telemetry Store
//!
//! Holds the latest value of every tracked simulator property, the unit label
//! shown next to it, and the connection status text. Readers either poll the
//! store or watch entries and consume change events.
//!
//! ```rust,ignore
//! use telemetry_store::TelemetryStore;
//!
//! let store = TelemetryStore::new();
//! store.watch_status();
//!
//! // ... hand a clone to the bridge as its presentation sink ...
//!
//! for event in store.iter() {
//!     match event.property_id() {
//!         Some(id) => println!("{} {:?} {:?}", id, store.text(id), store.unit(id)),
//!         None => println!("status: {:?}", store.status()),
//!     }
//! }
//! ```

pub mod event;
pub mod store;

pub use event::{ChangeEvent, ChangeIterator, ChangeKind};
pub use store::{LatestValue, TelemetryStore};
