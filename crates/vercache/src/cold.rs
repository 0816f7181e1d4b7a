//! The shared remote cold tier adapter.

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use vercache_core::FieldMap;
use vercache_kv::{KvError, KvService};

/// Adapter for entity field-maps in the remote data namespace.
///
/// Backed by the same key-value service as the version store; the two
/// namespaces stay disjoint by key construction. Every write carries the
/// uniform configured TTL.
pub struct ColdCache {
    kv: Arc<dyn KvService>,
    ttl: Duration,
}

impl ColdCache {
    /// Creates an adapter over the given service; `ttl` applies to every
    /// write.
    #[must_use]
    pub fn new(kv: Arc<dyn KvService>, ttl: Duration) -> Self {
        Self { kv, ttl }
    }

    /// Reads the field-map stored under a data key.
    ///
    /// # Errors
    ///
    /// Returns `KvError::InvalidValue` when the stored value is not a JSON
    /// object.
    pub async fn get(&self, key: &str) -> Result<Option<FieldMap>, KvError> {
        match self.kv.get(key).await? {
            None => Ok(None),
            Some(Value::Object(map)) => Ok(Some(map.into_iter().collect())),
            Some(_) => Err(KvError::invalid_value(key, "not an object")),
        }
    }

    /// Writes a field-map under a data key with the configured TTL.
    pub async fn set(&self, key: &str, map: &FieldMap) -> Result<(), KvError> {
        let value = Value::Object(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect());
        self.kv.set(key, value, Some(self.ttl)).await
    }
}

impl std::fmt::Debug for ColdCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColdCache").field("ttl", &self.ttl).finish()
    }
}
