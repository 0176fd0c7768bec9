//! Property registry
//!
//! The fixed set of simulator variables the bridge tracks. Built once at
//! startup and shared read-only (behind an `Arc`) by every component.
//! Iteration order is insertion order; it drives registration and polling
//! order but nothing depends on it for correctness.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sim_api::{DataType, PropertyId};

use crate::error::ConfigError;

/// One simulator variable the bridge monitors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedProperty {
    /// Definition id and request id
    pub id: PropertyId,
    /// Simulator variable name, e.g. `PLANE ALTITUDE`
    pub field_name: String,
    /// Unit the simulator should report in, e.g. `feet`
    pub unit: String,
    /// Payload encoding
    #[serde(default)]
    pub data_type: DataType,
}

impl TrackedProperty {
    /// A property reported as a 64-bit float.
    pub fn new(
        id: impl Into<PropertyId>,
        field_name: impl Into<String>,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            field_name: field_name.into(),
            unit: unit.into(),
            data_type: DataType::Float64,
        }
    }

    pub fn with_data_type(mut self, data_type: DataType) -> Self {
        self.data_type = data_type;
        self
    }

    /// Parse the compact `"FIELD NAME,unit"` notation.
    pub fn parse_compact(id: impl Into<PropertyId>, entry: &str) -> Result<Self, ConfigError> {
        let (field_name, unit) = entry
            .split_once(',')
            .ok_or_else(|| ConfigError::InvalidCompactEntry(entry.to_string()))?;

        let field_name = field_name.trim();
        let unit = unit.trim();
        if field_name.is_empty() || unit.is_empty() || unit.contains(',') {
            return Err(ConfigError::InvalidCompactEntry(entry.to_string()));
        }

        Ok(Self::new(id, field_name, unit))
    }
}

/// Ordered, immutable set of tracked properties.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyRegistry {
    properties: Vec<TrackedProperty>,
    index: HashMap<PropertyId, usize>,
}

impl PropertyRegistry {
    /// Build a registry, rejecting duplicate ids, id 0 and empty names.
    pub fn new(properties: Vec<TrackedProperty>) -> Result<Self, ConfigError> {
        let mut index = HashMap::with_capacity(properties.len());

        for (position, property) in properties.iter().enumerate() {
            if property.id.get() == 0 {
                return Err(ConfigError::ReservedPropertyId);
            }
            if property.field_name.trim().is_empty() {
                return Err(ConfigError::EmptyFieldName(property.id));
            }
            if index.insert(property.id, position).is_some() {
                return Err(ConfigError::DuplicateProperty(property.id));
            }
        }

        Ok(Self { properties, index })
    }

    /// The aircraft position and speed set: longitude, latitude, magnetic
    /// heading, altitude and indicated airspeed.
    pub fn default_aircraft() -> Self {
        let properties = vec![
            TrackedProperty::new(1, "PLANE LONGITUDE", "degree"),
            TrackedProperty::new(2, "PLANE LATITUDE", "degree"),
            TrackedProperty::new(3, "PLANE HEADING DEGREES MAGNETIC", "degree"),
            TrackedProperty::new(4, "PLANE ALTITUDE", "feet"),
            TrackedProperty::new(5, "AIRSPEED INDICATED", "knots"),
        ];

        let index = properties
            .iter()
            .enumerate()
            .map(|(position, p)| (p.id, position))
            .collect();

        Self { properties, index }
    }

    /// Build a registry from `(id, "FIELD NAME,unit")` pairs.
    pub fn from_compact<'a, I>(entries: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (u32, &'a str)>,
    {
        let properties = entries
            .into_iter()
            .map(|(id, entry)| TrackedProperty::parse_compact(id, entry))
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(properties)
    }

    /// Load a registry from a JSON array of properties.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let properties: Vec<TrackedProperty> = serde_json::from_str(json)?;
        Self::new(properties)
    }

    /// Tracked properties in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, TrackedProperty> {
        self.properties.iter()
    }

    pub fn tracked_properties(&self) -> &[TrackedProperty] {
        &self.properties
    }

    pub fn get(&self, id: PropertyId) -> Option<&TrackedProperty> {
        self.index
            .get(&id)
            .map(|&position| &self.properties[position])
    }

    pub fn contains(&self, id: PropertyId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn ids(&self) -> Vec<PropertyId> {
        self.properties.iter().map(|p| p.id).collect()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl Default for PropertyRegistry {
    fn default() -> Self {
        Self::default_aircraft()
    }
}

impl<'a> IntoIterator for &'a PropertyRegistry {
    type Item = &'a TrackedProperty;
    type IntoIter = std::slice::Iter<'a, TrackedProperty>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
