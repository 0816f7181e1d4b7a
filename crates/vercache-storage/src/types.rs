//! Query types for entity store operations.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use vercache_core::{EntityKind, FieldMap};

/// A query against the entity store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityQuery {
    /// The kind of entity being queried.
    pub kind: EntityKind,
    /// The filter selecting entities of that kind.
    pub filter: QueryFilter,
}

/// The filter part of a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryFilter {
    /// A bare entity id.
    Id(String),
    /// Field equality conditions; all must match.
    Fields(FieldMap),
}

impl EntityQuery {
    /// Creates a query for a single entity by id.
    #[must_use]
    pub fn by_id(kind: EntityKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            filter: QueryFilter::Id(id.into()),
        }
    }

    /// Creates a field-equality query.
    #[must_use]
    pub fn by_fields(kind: EntityKind, fields: FieldMap) -> Self {
        Self {
            kind,
            filter: QueryFilter::Fields(fields),
        }
    }

    /// Adds a field condition.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        match &mut self.filter {
            QueryFilter::Fields(fields) => {
                fields.insert(key.into(), value);
            }
            QueryFilter::Id(id) => {
                let mut fields = FieldMap::new();
                fields.insert("id".to_string(), Value::String(std::mem::take(id)));
                fields.insert(key.into(), value);
                self.filter = QueryFilter::Fields(fields);
            }
        }
        self
    }

    /// Reduces this query to an exact id, if it has one.
    ///
    /// Only two shapes qualify: a bare id, or a field-map whose single
    /// populated field is `id` with a string or number value. Everything
    /// else is a compound query and bypasses the cache.
    #[must_use]
    pub fn exact_id(&self) -> Option<String> {
        match &self.filter {
            QueryFilter::Id(id) => Some(id.clone()),
            QueryFilter::Fields(fields) => {
                if fields.len() != 1 {
                    return None;
                }
                match fields.get("id") {
                    Some(Value::String(s)) => Some(s.clone()),
                    Some(Value::Number(n)) => Some(n.to_string()),
                    _ => None,
                }
            }
        }
    }
}
