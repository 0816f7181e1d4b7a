//! Cache middleware configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use vercache_core::EntityKind;

/// Configuration for a [`CachedStore`](crate::CachedStore).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Key prefix shared by the version and data namespaces.
    pub prefix: String,
    /// Maximum hot-tier entry count. A capacity of zero disables the hot
    /// tier entirely.
    pub max_hot: usize,
    /// Time-to-live applied to every remote write (data entries, version
    /// keys, and tombstones alike).
    pub expires: Duration,
    /// Kinds that participate in caching. `None` caches all kinds;
    /// operations on kinds outside the list bypass the cache entirely.
    pub kinds: Option<Vec<EntityKind>>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            prefix: "vercache".to_string(),
            max_hot: 1111,
            expires: Duration::from_secs(3600),
            kinds: None,
        }
    }
}

impl CacheConfig {
    /// Creates a config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the key prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Sets the hot-tier capacity.
    #[must_use]
    pub fn with_max_hot(mut self, max_hot: usize) -> Self {
        self.max_hot = max_hot;
        self
    }

    /// Sets the remote TTL.
    #[must_use]
    pub fn with_expires(mut self, expires: Duration) -> Self {
        self.expires = expires;
        self
    }

    /// Restricts caching to the given kinds.
    #[must_use]
    pub fn with_kinds(mut self, kinds: Vec<EntityKind>) -> Self {
        self.kinds = Some(kinds);
        self
    }
}
