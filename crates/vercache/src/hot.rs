//! The bounded in-process hot tier.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use vercache_core::FieldMap;

/// Bounded LRU mapping from data keys to entity field-maps.
///
/// Entries have no TTL; staleness is controlled entirely by the version-key
/// indirection, so an old generation's entry simply stops being looked up.
/// A capacity of zero disables the tier: every lookup misses and every
/// insert is a no-op.
///
/// Values are deep-cloned on the way in and out, so callers can mutate a
/// loaded entity without damaging the cached copy.
pub struct HotCache {
    inner: Option<Mutex<LruCache<String, FieldMap>>>,
}

impl std::fmt::Debug for HotCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HotCache")
            .field("enabled", &self.inner.is_some())
            .field("len", &self.len())
            .finish()
    }
}

impl HotCache {
    /// Creates a hot cache bounded to `capacity` entries.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap))),
        }
    }

    /// Looks up a data key, promoting it to most-recently-used on a hit.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<FieldMap> {
        let inner = self.inner.as_ref()?;
        let mut cache = inner.lock().unwrap_or_else(|e| e.into_inner());
        cache.get(key).cloned()
    }

    /// Inserts a value, evicting the least-recently-used entry when full.
    pub fn insert(&self, key: String, value: FieldMap) {
        if let Some(inner) = &self.inner {
            let mut cache = inner.lock().unwrap_or_else(|e| e.into_inner());
            cache.put(key, value);
        }
    }

    /// Current entry count.
    #[must_use]
    pub fn len(&self) -> usize {
        match &self.inner {
            Some(inner) => inner.lock().unwrap_or_else(|e| e.into_inner()).len(),
            None => 0,
        }
    }

    /// Returns `true` if the tier holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resident keys from most-recently-used to least-recently-used.
    ///
    /// Introspection only; listing does not touch access order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        match &self.inner {
            Some(inner) => {
                let cache = inner.lock().unwrap_or_else(|e| e.into_inner());
                cache.iter().map(|(key, _)| key.clone()).collect()
            }
            None => Vec::new(),
        }
    }
}
