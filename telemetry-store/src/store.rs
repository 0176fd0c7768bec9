//! Latest-value storage for tracked telemetry
//!
//! `TelemetryStore` is the presentation side of the bridge: the bridge writes
//! the connection status, unit labels and the latest value of each property,
//! and any number of readers (a UI thread, a logger) observe them.

use std::collections::{HashMap, HashSet};
use std::sync::{mpsc, Arc, Mutex};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use sim_api::PropertyId;

use crate::event::{ChangeEvent, ChangeIterator, ChangeKind};

/// The most recent reading of one property
#[derive(Debug, Clone, PartialEq)]
pub struct LatestValue {
    /// Property the reading belongs to
    pub property_id: PropertyId,
    /// Numeric value
    pub value: f64,
    /// Display text the value was delivered as
    pub text: String,
    /// When the reading was stored
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Entries {
    values: HashMap<PropertyId, LatestValue>,
    units: HashMap<PropertyId, String>,
    status: Option<String>,
}

/// Shared store of latest telemetry values
///
/// Clones share the same entries and the same change queue.
///
/// # Example
///
/// ```rust
/// use sim_api::PropertyId;
/// use telemetry_store::TelemetryStore;
///
/// let store = TelemetryStore::new();
/// let altitude = PropertyId::new(4);
///
/// store.watch(altitude);
/// store.record(altitude, 3500.0, "3500");
///
/// assert_eq!(store.text(altitude).as_deref(), Some("3500"));
/// assert!(store.iter().try_recv().is_some());
/// ```
#[derive(Clone)]
pub struct TelemetryStore {
    entries: Arc<RwLock<Entries>>,
    watched: Arc<RwLock<HashSet<ChangeKind>>>,
    event_tx: mpsc::Sender<ChangeEvent>,
    event_rx: Arc<Mutex<mpsc::Receiver<ChangeEvent>>>,
}

impl TelemetryStore {
    pub fn new() -> Self {
        let (event_tx, event_rx) = mpsc::channel();

        Self {
            entries: Arc::new(RwLock::new(Entries::default())),
            watched: Arc::new(RwLock::new(HashSet::new())),
            event_tx,
            event_rx: Arc::new(Mutex::new(event_rx)),
        }
    }

    /// Store a reading. Emits a change event if the property is watched and
    /// the value differs from the previous reading.
    pub fn record(&self, property_id: PropertyId, value: f64, text: &str) {
        let changed = {
            let mut entries = self.entries.write();
            let previous = entries.values.get(&property_id).map(|v| v.value);
            entries.values.insert(
                property_id,
                LatestValue {
                    property_id,
                    value,
                    text: text.to_string(),
                    last_updated: Utc::now(),
                },
            );
            previous.map_or(true, |p| p.to_bits() != value.to_bits())
        };

        if changed {
            self.maybe_emit(ChangeKind::Value(property_id));
        }
    }

    /// Store the display text of the connection status
    pub fn set_status_text(&self, status: &str) {
        let changed = {
            let mut entries = self.entries.write();
            if entries.status.as_deref() == Some(status) {
                false
            } else {
                entries.status = Some(status.to_string());
                true
            }
        };

        if changed {
            tracing::debug!(status, "Status changed");
            self.maybe_emit(ChangeKind::Status);
        }
    }

    /// Store the unit label shown next to a property
    pub fn set_unit_label(&self, property_id: PropertyId, unit: &str) {
        self.entries
            .write()
            .units
            .insert(property_id, unit.to_string());
    }

    /// Latest reading of a property
    pub fn latest(&self, property_id: PropertyId) -> Option<LatestValue> {
        self.entries.read().values.get(&property_id).cloned()
    }

    /// Latest numeric value of a property
    pub fn value(&self, property_id: PropertyId) -> Option<f64> {
        self.entries
            .read()
            .values
            .get(&property_id)
            .map(|v| v.value)
    }

    /// Latest display text of a property
    pub fn text(&self, property_id: PropertyId) -> Option<String> {
        self.entries
            .read()
            .values
            .get(&property_id)
            .map(|v| v.text.clone())
    }

    /// Unit label of a property
    pub fn unit(&self, property_id: PropertyId) -> Option<String> {
        self.entries.read().units.get(&property_id).cloned()
    }

    /// Current connection status text
    pub fn status(&self) -> Option<String> {
        self.entries.read().status.clone()
    }

    /// All latest readings, ordered by property id
    pub fn snapshot(&self) -> Vec<LatestValue> {
        let mut values: Vec<_> = self.entries.read().values.values().cloned().collect();
        values.sort_by_key(|v| v.property_id);
        values
    }

    /// Number of properties with a reading
    pub fn len(&self) -> usize {
        self.entries.read().values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Register interest in a property's value changes
    pub fn watch(&self, property_id: PropertyId) {
        self.watched.write().insert(ChangeKind::Value(property_id));
    }

    /// Register interest in connection status changes
    pub fn watch_status(&self) {
        self.watched.write().insert(ChangeKind::Status);
    }

    pub fn unwatch(&self, property_id: PropertyId) {
        self.watched
            .write()
            .remove(&ChangeKind::Value(property_id));
    }

    pub fn is_watched(&self, property_id: PropertyId) -> bool {
        self.watched
            .read()
            .contains(&ChangeKind::Value(property_id))
    }

    /// Blocking iterator over change events of watched entries
    pub fn iter(&self) -> ChangeIterator {
        ChangeIterator::new(Arc::clone(&self.event_rx))
    }

    /// Forget every reading; units and status are kept
    pub fn clear_values(&self) {
        self.entries.write().values.clear();
    }

    fn maybe_emit(&self, kind: ChangeKind) {
        if self.watched.read().contains(&kind) {
            let _ = self.event_tx.send(ChangeEvent::new(kind));
        }
    }
}

impl Default for TelemetryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TelemetryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryStore")
            .field("value_count", &self.len())
            .field("status", &self.status())
            .finish()
    }
}
