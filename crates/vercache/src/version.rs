//! The version store adapter.
//!
//! A thin semantic layer over the remote key-value service for the version
//! namespace. The version key's value is the single source of truth for
//! "what generation is current" of one (kind, id) pair; the hot tier is
//! never consulted for version keys.

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use vercache_kv::{KvError, KvService};

const TOMBSTONE: i64 = -1;

/// The generation used when a version key is first created.
pub(crate) const INITIAL_GENERATION: u64 = 1;

/// Decoded state of a version key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    /// The key does not exist (never cached, or expired).
    Absent,
    /// The entity was explicitly removed; distinct from `Absent` in the
    /// store, identical in effect on loads.
    Tombstone,
    /// The current generation number.
    Current(u64),
}

impl Version {
    /// Returns `true` for the states a load treats as a version miss.
    #[must_use]
    pub fn is_miss(&self) -> bool {
        matches!(self, Self::Absent | Self::Tombstone)
    }
}

/// Adapter issuing atomic version-key operations against the remote
/// service.
///
/// Every operation is a single round-trip; failures surface unchanged and
/// are never retried here.
pub struct VersionStore {
    kv: Arc<dyn KvService>,
    ttl: Duration,
}

impl VersionStore {
    /// Creates an adapter over the given service; `ttl` bounds version-key
    /// and tombstone lifetime.
    #[must_use]
    pub fn new(kv: Arc<dyn KvService>, ttl: Duration) -> Self {
        Self { kv, ttl }
    }

    /// Reads and decodes a version key.
    ///
    /// # Errors
    ///
    /// Returns `KvError::InvalidValue` for a stored value that is not an
    /// integer or is negative without being the tombstone sentinel; the
    /// version namespace is written only by this protocol, so a malformed
    /// value is a fault to surface, not a miss.
    pub async fn get(&self, key: &str) -> Result<Version, KvError> {
        match self.kv.get(key).await? {
            None => Ok(Version::Absent),
            Some(value) => match value.as_i64() {
                Some(TOMBSTONE) => Ok(Version::Tombstone),
                Some(n) if n >= 0 => Ok(Version::Current(n as u64)),
                Some(_) => Err(KvError::invalid_value(key, "negative generation")),
                None => Err(KvError::invalid_value(key, "not an integer")),
            },
        }
    }

    /// Atomically advances the generation, returning the new value.
    ///
    /// Returns `None` when the key is absent, in which case the caller
    /// creates it.
    /// Incrementing a tombstone yields generation 0, the first live
    /// generation after a remove.
    pub async fn increment(&self, key: &str) -> Result<Option<u64>, KvError> {
        match self.kv.incr(key, 1).await? {
            None => Ok(None),
            Some(n) if n >= 0 => Ok(Some(n as u64)),
            Some(_) => Err(KvError::invalid_value(key, "negative generation")),
        }
    }

    /// Creates the version key at generation 1 if it is absent.
    ///
    /// Returns `false` when another process won the creation race. There is
    /// no tie-break: racing first-savers both proceed with generation 1,
    /// and the backend's own conflict handling decides which creation
    /// stuck.
    pub async fn create(&self, key: &str) -> Result<bool, KvError> {
        self.kv
            .add(key, Value::from(INITIAL_GENERATION), Some(self.ttl))
            .await
    }

    /// Writes the tombstone sentinel: an explicit write of -1, not a
    /// deletion.
    pub async fn tombstone(&self, key: &str) -> Result<(), KvError> {
        self.kv.set(key, Value::from(TOMBSTONE), Some(self.ttl)).await
    }
}

impl std::fmt::Debug for VersionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionStore").field("ttl", &self.ttl).finish()
    }
}
