//! In-process key-value backend with TTL support.

use crate::service::{KvError, KvService};
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde_json::Value;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct StoredValue {
    value: Value,
    expires_at: Option<Instant>,
}

impl StoredValue {
    fn new(value: Value, ttl: Option<Duration>) -> Self {
        Self {
            value,
            expires_at: ttl.map(|d| Instant::now() + d),
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// In-memory `KvService` implementation.
///
/// Entries live in a sharded concurrent map; per-key mutation happens under
/// the shard lock, which makes `add` and `incr` atomic with respect to each
/// other and to `set`. Expiry is lazy: expired entries answer as absent and
/// are dropped when next touched.
#[derive(Debug, Default)]
pub struct MemoryKv {
    entries: DashMap<String, StoredValue>,
}

impl MemoryKv {
    /// Creates a new, empty in-memory service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| !e.is_expired()).count()
    }

    /// Returns `true` if no live entries exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops a key outright. Used by tests to simulate remote eviction.
    pub fn evict(&self, key: &str) -> Option<Value> {
        self.entries.remove(key).map(|(_, stored)| stored.value)
    }

    fn drop_if_expired(&self, key: &str) {
        self.entries.remove_if(key, |_, stored| stored.is_expired());
    }
}

#[async_trait]
impl KvService for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<Value>, KvError> {
        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired() {
                return Ok(Some(entry.value.clone()));
            }
        }
        self.drop_if_expired(key);
        Ok(None)
    }

    async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<(), KvError> {
        self.entries
            .insert(key.to_string(), StoredValue::new(value, ttl));
        Ok(())
    }

    async fn add(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<bool, KvError> {
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_expired() {
                    occupied.insert(StoredValue::new(value, ttl));
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(StoredValue::new(value, ttl));
                Ok(true)
            }
        }
    }

    async fn incr(&self, key: &str, delta: i64) -> Result<Option<i64>, KvError> {
        {
            if let Some(mut entry) = self.entries.get_mut(key) {
                if !entry.is_expired() {
                    let Some(current) = entry.value.as_i64() else {
                        return Err(KvError::invalid_value(key, "not an integer"));
                    };
                    let next = current + delta;
                    entry.value = Value::from(next);
                    return Ok(Some(next));
                }
            }
        }
        self.drop_if_expired(key);
        Ok(None)
    }
}
