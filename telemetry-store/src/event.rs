//! Change events and the iterator that delivers them
//!
//! A `ChangeEvent` names what changed, not the new value. Read the value back
//! from the store after receiving the event.

use std::sync::{mpsc, Arc, Mutex};
use std::time::{Duration, Instant};

use sim_api::PropertyId;

/// What changed in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// The latest value of a property changed
    Value(PropertyId),
    /// The connection status text changed
    Status,
}

/// A change event emitted for watched entries
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    /// What changed
    pub kind: ChangeKind,

    /// When the change was detected
    pub timestamp: Instant,
}

impl ChangeEvent {
    pub fn new(kind: ChangeKind) -> Self {
        Self {
            kind,
            timestamp: Instant::now(),
        }
    }

    /// The property whose value changed, if this is a value change
    pub fn property_id(&self) -> Option<PropertyId> {
        match self.kind {
            ChangeKind::Value(id) => Some(id),
            ChangeKind::Status => None,
        }
    }
}

impl PartialEq for ChangeEvent {
    fn eq(&self, other: &Self) -> bool {
        // Timestamp not included in equality
        self.kind == other.kind
    }
}

/// Blocking iterator over change events
///
/// All clones of a store share one event queue, so each event is delivered
/// to exactly one iterator.
///
/// ```rust,ignore
/// for event in store.iter() {
///     if let Some(id) = event.property_id() {
///         println!("{} = {:?}", id, store.text(id));
///     }
/// }
/// ```
pub struct ChangeIterator {
    rx: Arc<Mutex<mpsc::Receiver<ChangeEvent>>>,
}

impl ChangeIterator {
    pub(crate) fn new(rx: Arc<Mutex<mpsc::Receiver<ChangeEvent>>>) -> Self {
        Self { rx }
    }

    /// Block until the next event; `None` once the store is gone
    pub fn recv(&self) -> Option<ChangeEvent> {
        self.rx.lock().ok()?.recv().ok()
    }

    /// Block until the next event or until `timeout` expires
    pub fn recv_timeout(&self, timeout: Duration) -> Option<ChangeEvent> {
        self.rx.lock().ok()?.recv_timeout(timeout).ok()
    }

    /// Take the next event if one is queued
    ///
    /// Never blocks: returns `None` while another iterator over the same
    /// store is waiting in [`recv`](Self::recv).
    pub fn try_recv(&self) -> Option<ChangeEvent> {
        self.rx.try_lock().ok()?.try_recv().ok()
    }

    /// Drain the currently queued events without blocking
    pub fn try_iter(&self) -> impl Iterator<Item = ChangeEvent> + '_ {
        std::iter::from_fn(move || self.try_recv())
    }
}

impl Iterator for ChangeIterator {
    type Item = ChangeEvent;

    fn next(&mut self) -> Option<Self::Item> {
        self.recv()
    }
}
