use crate::kind::EntityKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// An entity's field values, keyed by field name.
///
/// This is the representation that moves through the cache tiers: the cold
/// tier stores it as a JSON object, the hot tier holds deep clones of it.
pub type FieldMap = HashMap<String, Value>;

/// A named, identified bag of fields.
///
/// The persistent store owns identity assignment: an entity saved without an
/// id comes back with one, and the cache layer never invents an id itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub kind: EntityKind,
    #[serde(flatten)]
    pub data: FieldMap,
}

impl Entity {
    /// Creates a new entity of the given kind with no id and no fields.
    #[must_use]
    pub fn new(kind: EntityKind) -> Self {
        Self {
            id: None,
            kind,
            data: FieldMap::new(),
        }
    }

    /// Sets the id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Adds a field.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    pub fn set_field(&mut self, key: impl Into<String>, value: Value) {
        self.data.insert(key.into(), value);
    }

    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn remove_field(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }

    /// The full field-map including the id, if one is assigned.
    ///
    /// This is the value written into the cache tiers; `from_data` is its
    /// inverse.
    #[must_use]
    pub fn data_map(&self) -> FieldMap {
        let mut map = self.data.clone();
        if let Some(id) = &self.id {
            map.insert("id".to_string(), Value::String(id.clone()));
        }
        map
    }

    /// Materializes an entity of the given kind from a cached field-map.
    ///
    /// An `id` field is lifted out of the map into the entity's id; numeric
    /// ids are stringified.
    #[must_use]
    pub fn from_data(kind: EntityKind, mut data: FieldMap) -> Self {
        let id = match data.remove("id") {
            Some(Value::String(s)) => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(other) => {
                // Unrecognized id shape stays a plain field.
                data.insert("id".to_string(), other);
                None
            }
            None => None,
        };
        Self { id, kind, data }
    }
}
