//! Shared fixtures for the bridge integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use sim_api::memory::InMemorySimulator;
use sim_bridge::{
    BridgeConfig, PresentationSink, PropertyId, PropertyRegistry, SessionManager,
    TrackedProperty,
};

/// One call made on the presentation sink
#[derive(Debug, Clone, PartialEq)]
pub enum SinkCall {
    Status(String),
    Value(PropertyId, String),
    Unit(PropertyId, String),
}

/// Sink that records every call in order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    calls: Mutex<Vec<SinkCall>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn statuses(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                SinkCall::Status(status) => Some(status),
                _ => None,
            })
            .collect()
    }

    pub fn values(&self) -> Vec<(PropertyId, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                SinkCall::Value(id, text) => Some((id, text)),
                _ => None,
            })
            .collect()
    }

    pub fn count_status(&self, status: &str) -> usize {
        self.statuses().iter().filter(|s| *s == status).count()
    }
}

impl PresentationSink for RecordingSink {
    fn set_status(&self, status: &str) {
        self.calls
            .lock()
            .unwrap()
            .push(SinkCall::Status(status.to_string()));
    }

    fn set_value(&self, property_id: PropertyId, text: &str) {
        self.calls
            .lock()
            .unwrap()
            .push(SinkCall::Value(property_id, text.to_string()));
    }

    fn set_unit(&self, property_id: PropertyId, unit: &str) {
        self.calls
            .lock()
            .unwrap()
            .push(SinkCall::Unit(property_id, unit.to_string()));
    }
}

/// Registry tracking only the altitude, as id 1
pub fn altitude_registry() -> Arc<PropertyRegistry> {
    let altitude = TrackedProperty::new(1, "PLANE ALTITUDE", "feet");
    Arc::new(PropertyRegistry::new(vec![altitude]).unwrap())
}

/// Registry with ids 1..=count
pub fn numbered_registry(count: u32) -> Arc<PropertyRegistry> {
    let properties = (1..=count)
        .map(|id| TrackedProperty::new(id, format!("VARIABLE {}", id), "number"))
        .collect();
    Arc::new(PropertyRegistry::new(properties).unwrap())
}

pub fn session_with(
    sim: &InMemorySimulator,
    config: BridgeConfig,
    registry: Arc<PropertyRegistry>,
    sink: Arc<dyn PresentationSink>,
) -> SessionManager<InMemorySimulator> {
    SessionManager::new(sim.clone(), config, registry, sink)
}
