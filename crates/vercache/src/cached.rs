//! CachedStore - the versioned two-tier cache decorator.
//!
//! This wrapper delegates save/load/remove to an inner persistent store
//! while maintaining a per-entity generation counter and two cache tiers
//! (a bounded in-process hot tier and a shared remote cold tier). The
//! version key is consulted on every cached read, so a stale tier entry is
//! never served as current, without invalidation broadcasts and without
//! cross-process coordination beyond atomic counter operations on the
//! remote service.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use vercache::{CacheConfig, CachedStore};
//!
//! let store = CachedStore::new(postgres_store, Arc::new(redis_kv));
//!
//! // Transparent on success: callers use the EntityStore interface.
//! let saved = store.save(&entity).await?;
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::cold::ColdCache;
use crate::config::CacheConfig;
use crate::hot::HotCache;
use crate::keys::KeyScheme;
use crate::stats::{CacheStats, StatsSnapshot};
use crate::version::{INITIAL_GENERATION, Version, VersionStore};
use vercache_core::{Entity, EntityKind, FieldMap};
use vercache_kv::{KvError, KvService};
use vercache_storage::{EntityQuery, EntityStore, StorageError};

/// A write-through/read-through caching decorator around an entity store.
///
/// `CachedStore` implements [`EntityStore`] by delegating to an inner
/// implementation: the store stays the system of record (writes go there
/// first, cache misses fall back to it), and the cache layer only ever
/// shortcuts reads whose generation is known current.
///
/// Each invocation is an independent pipeline; nothing is serialized per
/// (kind, id) and no locks are held across awaits. The hot tier is the only
/// shared mutable in-process state.
pub struct CachedStore<S> {
    /// The inner persistent store.
    inner: S,
    keys: KeyScheme,
    hot: HotCache,
    versions: VersionStore,
    cold: ColdCache,
    stats: Arc<CacheStats>,
    /// Kinds that participate in caching; `None` means all kinds.
    kinds: Option<HashSet<EntityKind>>,
}

impl<S: EntityStore> CachedStore<S> {
    /// Creates a cached store with default configuration.
    pub fn new(inner: S, kv: Arc<dyn KvService>) -> Self {
        Self::with_config(inner, kv, CacheConfig::default())
    }

    /// Creates a cached store with the given configuration.
    ///
    /// The allow-list of cached kinds is resolved here, once; it is never
    /// re-derived at operation time.
    pub fn with_config(inner: S, kv: Arc<dyn KvService>, config: CacheConfig) -> Self {
        let CacheConfig {
            prefix,
            max_hot,
            expires,
            kinds,
        } = config;
        Self {
            inner,
            keys: KeyScheme::new(prefix),
            hot: HotCache::new(max_hot),
            versions: VersionStore::new(Arc::clone(&kv), expires),
            cold: ColdCache::new(kv, expires),
            stats: Arc::new(CacheStats::new()),
            kinds: kinds.map(|list| list.into_iter().collect()),
        }
    }

    /// Get a reference to the inner store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Takes a point-in-time statistics snapshot.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot(self.hot.len())
    }

    /// Lists resident hot-tier keys, most-recently-used first.
    pub fn hot_keys(&self) -> Vec<String> {
        self.hot.keys()
    }

    fn caches_kind(&self, kind: &EntityKind) -> bool {
        self.kinds.as_ref().is_none_or(|set| set.contains(kind))
    }

    /// Counts and converts a remote-service failure. Persistent-store
    /// errors never pass through here.
    fn remote_error(&self, err: KvError) -> StorageError {
        self.stats.record_cache_err();
        warn!(error = %err, "remote cache failure");
        StorageError::cache_backend(err.to_string())
    }

    /// Creates the version key at generation 1, counting the creation.
    async fn create_version(&self, vkey: &str) -> Result<(), StorageError> {
        let created = self
            .versions
            .create(vkey)
            .await
            .map_err(|e| self.remote_error(e))?;
        if !created {
            // A concurrent first-writer got there first; both proceed with
            // generation 1 (accepted race, no tie-break).
            debug!(key = %vkey, "lost version creation race");
        }
        self.stats.record_vadd();
        Ok(())
    }

    /// Writes an entity's field-map under its data key: hot tier first
    /// (never fails), then the cold tier with TTL.
    async fn write_data(
        &self,
        kind: &EntityKind,
        id: &str,
        map: FieldMap,
        generation: u64,
    ) -> Result<(), StorageError> {
        let dkey = self.keys.data_key(kind, id, generation);
        debug!(key = %dkey, "set");

        self.hot.insert(dkey.clone(), map.clone());
        self.cold
            .set(&dkey, &map)
            .await
            .map_err(|e| self.remote_error(e))?;
        self.stats.record_set();
        Ok(())
    }
}

#[async_trait]
impl<S: EntityStore> EntityStore for CachedStore<S> {
    async fn save(&self, entity: &Entity) -> Result<Entity, StorageError> {
        if !self.caches_kind(&entity.kind) {
            return self.inner.save(entity).await;
        }

        // System of record first; its failure propagates verbatim with no
        // cache mutation.
        let saved = self.inner.save(entity).await?;
        let id = saved.id.clone().ok_or_else(|| {
            StorageError::invalid_entity("store returned a saved entity without an id")
        })?;

        let vkey = self.keys.version_key(&saved.kind, &id);
        let generation = match self
            .versions
            .increment(&vkey)
            .await
            .map_err(|e| self.remote_error(e))?
        {
            Some(generation) => {
                self.stats.record_vinc();
                generation
            }
            None => {
                self.create_version(&vkey).await?;
                INITIAL_GENERATION
            }
        };

        self.write_data(&saved.kind, &id, saved.data_map(), generation)
            .await?;
        Ok(saved)
    }

    async fn load(&self, query: &EntityQuery) -> Result<Option<Entity>, StorageError> {
        if !self.caches_kind(&query.kind) {
            return self.inner.load(query).await;
        }
        // Only exact single-id lookups participate in caching.
        let Some(id) = query.exact_id() else {
            return self.inner.load(query).await;
        };

        let vkey = self.keys.version_key(&query.kind, &id);
        let version = self
            .versions
            .get(&vkey)
            .await
            .map_err(|e| self.remote_error(e))?;
        self.stats.record_get();

        let generation = match version {
            Version::Absent | Version::Tombstone => {
                self.stats.record_vmiss();
                debug!(key = %vkey, "miss (version)");

                let Some(found) = self.inner.load(query).await? else {
                    // Not-found is a valid outcome, never cached: a later
                    // legitimate write must become visible.
                    return Ok(None);
                };

                // The entity exists after all; rebuild a fresh generation.
                self.create_version(&vkey).await?;
                self.write_data(&query.kind, &id, found.data_map(), INITIAL_GENERATION)
                    .await?;
                return Ok(Some(found));
            }
            Version::Current(generation) => generation,
        };

        self.stats.record_vhit();
        let dkey = self.keys.data_key(&query.kind, &id, generation);

        if let Some(map) = self.hot.get(&dkey) {
            self.stats.record_hot_hit();
            debug!(key = %dkey, "hit (hot)");
            return Ok(Some(Entity::from_data(query.kind.clone(), map)));
        }
        self.stats.record_hot_miss();
        debug!(key = %dkey, "miss (hot)");

        match self.cold.get(&dkey).await.map_err(|e| self.remote_error(e))? {
            Some(map) => {
                self.stats.record_net_hit();
                debug!(key = %dkey, "hit (net)");
                self.hot.insert(dkey, map.clone());
                Ok(Some(Entity::from_data(query.kind.clone(), map)))
            }
            None => {
                self.stats.record_net_miss();
                debug!(key = %dkey, "miss (net)");

                let Some(found) = self.inner.load(query).await? else {
                    return Ok(None);
                };
                // Rewrite under the existing generation, not a new one.
                self.write_data(&query.kind, &id, found.data_map(), generation)
                    .await?;
                Ok(Some(found))
            }
        }
    }

    async fn remove(&self, query: &EntityQuery) -> Result<(), StorageError> {
        if !self.caches_kind(&query.kind) {
            return self.inner.remove(query).await;
        }

        // System of record first; no tombstone on failure.
        self.inner.remove(query).await?;

        // A compound remove has no single version key to tombstone.
        let Some(id) = query.exact_id() else {
            return Ok(());
        };

        let vkey = self.keys.version_key(&query.kind, &id);
        self.versions
            .tombstone(&vkey)
            .await
            .map_err(|e| self.remote_error(e))?;
        self.stats.record_drop();
        debug!(key = %vkey, "drop");
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        self.inner.backend_name()
    }
}

impl<S: EntityStore> std::fmt::Debug for CachedStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedStore")
            .field("backend", &self.inner.backend_name())
            .field("hotsize", &self.hot.len())
            .finish()
    }
}
