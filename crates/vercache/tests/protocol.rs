//! End-to-end protocol tests: the cache decorator running against the
//! in-memory entity store and key-value service.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use vercache::{
    CacheConfig, CachedStore, Entity, EntityKind, EntityQuery, EntityStore, FieldMap, KeyScheme,
    KvError, KvService, MemoryKv, StorageError,
};
use vercache_db_memory::MemoryStore;

fn kind(name: &str) -> EntityKind {
    EntityKind::new(name).unwrap()
}

fn user(id: &str) -> EntityQuery {
    EntityQuery::by_id(kind("user"), id)
}

fn small_config() -> CacheConfig {
    CacheConfig::new().with_expires(Duration::from_secs(60))
}

fn cached(config: CacheConfig) -> (CachedStore<MemoryStore>, Arc<MemoryKv>) {
    let kv = Arc::new(MemoryKv::new());
    let store = CachedStore::with_config(MemoryStore::new(), kv.clone(), config);
    (store, kv)
}

/// A store whose every operation fails, for error-isolation tests.
struct FailingStore;

#[async_trait]
impl EntityStore for FailingStore {
    async fn save(&self, _entity: &Entity) -> Result<Entity, StorageError> {
        Err(StorageError::connection_error("store down"))
    }

    async fn load(&self, _query: &EntityQuery) -> Result<Option<Entity>, StorageError> {
        Err(StorageError::connection_error("store down"))
    }

    async fn remove(&self, _query: &EntityQuery) -> Result<(), StorageError> {
        Err(StorageError::connection_error("store down"))
    }

    fn backend_name(&self) -> &'static str {
        "failing"
    }
}

/// A key-value service with a switchable injected transport failure.
struct FlakyKv {
    inner: MemoryKv,
    failing: AtomicBool,
}

impl FlakyKv {
    fn new() -> Self {
        Self {
            inner: MemoryKv::new(),
            failing: AtomicBool::new(false),
        }
    }

    fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), KvError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(KvError::transport("injected failure"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl KvService for FlakyKv {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, KvError> {
        self.check()?;
        self.inner.get(key).await
    }

    async fn set(
        &self,
        key: &str,
        value: serde_json::Value,
        ttl: Option<Duration>,
    ) -> Result<(), KvError> {
        self.check()?;
        self.inner.set(key, value, ttl).await
    }

    async fn add(
        &self,
        key: &str,
        value: serde_json::Value,
        ttl: Option<Duration>,
    ) -> Result<bool, KvError> {
        self.check()?;
        self.inner.add(key, value, ttl).await
    }

    async fn incr(&self, key: &str, delta: i64) -> Result<Option<i64>, KvError> {
        self.check()?;
        self.inner.incr(key, delta).await
    }
}

#[tokio::test]
async fn round_trip_save_then_load() {
    let (store, _kv) = cached(small_config());

    let saved = store
        .save(&Entity::new(kind("user")).with_field("a", json!(1)))
        .await
        .unwrap();
    let id = saved.id.clone().unwrap();

    let loaded = store.load(&user(&id)).await.unwrap().unwrap();
    assert_eq!(loaded, saved);
    assert_eq!(loaded.field("a"), Some(&json!(1)));
}

#[tokio::test]
async fn concrete_counter_scenario() {
    let (store, kv) = cached(small_config());
    let keys = KeyScheme::new("vercache");

    // Save a fresh entity: generation 1 is created.
    let saved = store
        .save(&Entity::new(kind("user")).with_id("u1").with_field("a", json!(1)))
        .await
        .unwrap();
    assert_eq!(saved.id.as_deref(), Some("u1"));

    let snap = store.stats();
    assert_eq!(snap.set, 1);
    assert_eq!(snap.vadd, 1);
    assert_eq!(snap.vinc, 0);
    assert_eq!(snap.get, 0);
    assert_eq!(snap.hotsize, 1);
    assert_eq!(
        kv.get(&keys.version_key(&kind("user"), "u1")).await.unwrap(),
        Some(json!(1))
    );

    // Load: version hit, hot hit, no remote data fetch.
    let loaded = store.load(&user("u1")).await.unwrap().unwrap();
    assert_eq!(loaded.field("a"), Some(&json!(1)));

    let snap = store.stats();
    assert_eq!(snap.get, 1);
    assert_eq!(snap.vhit, 1);
    assert_eq!(snap.hot_hit, 1);
    assert_eq!(snap.net_hit, 0);

    // Update: generation advances to 2.
    store
        .save(
            &Entity::new(kind("user"))
                .with_id("u1")
                .with_field("a", json!(1))
                .with_field("b", json!(5)),
        )
        .await
        .unwrap();

    let snap = store.stats();
    assert_eq!(snap.set, 2);
    assert_eq!(snap.vinc, 1);
    assert_eq!(snap.vadd, 1);
    assert_eq!(
        kv.get(&keys.version_key(&kind("user"), "u1")).await.unwrap(),
        Some(json!(2))
    );
    // Both generations are resident, newest first.
    assert_eq!(
        store.hot_keys(),
        vec![
            keys.data_key(&kind("user"), "u1", 2),
            keys.data_key(&kind("user"), "u1", 1),
        ]
    );

    // Remove, then load: tombstoned version falls through to not-found.
    store.remove(&user("u1")).await.unwrap();
    assert_eq!(store.stats().drop, 1);

    let gone = store.load(&user("u1")).await.unwrap();
    assert!(gone.is_none());

    let snap = store.stats();
    assert_eq!(snap.vmiss, 1);
    assert_eq!(snap.cache_errs, 0);
}

#[tokio::test]
async fn generation_monotonicity() {
    let (store, kv) = cached(small_config());
    let keys = KeyScheme::new("vercache");

    for n in 0..5 {
        store
            .save(&Entity::new(kind("user")).with_id("u1").with_field("n", json!(n)))
            .await
            .unwrap();
    }

    assert_eq!(
        kv.get(&keys.version_key(&kind("user"), "u1")).await.unwrap(),
        Some(json!(5))
    );
    let snap = store.stats();
    assert_eq!(snap.vadd, 1);
    assert_eq!(snap.vinc, 4);
    assert_eq!(snap.set, 5);
}

#[tokio::test]
async fn tier_promotion_cold_hit_repopulates_hot() {
    let (store, _kv) = cached(small_config().with_max_hot(1));
    let keys = KeyScheme::new("vercache");

    store
        .save(&Entity::new(kind("user")).with_id("a").with_field("n", json!(1)))
        .await
        .unwrap();
    // Second id evicts the first from the one-slot hot tier.
    store
        .save(&Entity::new(kind("user")).with_id("b").with_field("n", json!(2)))
        .await
        .unwrap();
    assert_eq!(store.stats().hotsize, 1);

    let loaded = store.load(&user("a")).await.unwrap().unwrap();
    assert_eq!(loaded.field("n"), Some(&json!(1)));

    let snap = store.stats();
    assert_eq!(snap.hot_miss, 1);
    assert_eq!(snap.net_hit, 1);
    assert_eq!(snap.net_miss, 0);
    assert_eq!(snap.hotsize, 1);
    // The promoted entry is back in the hot tier.
    assert_eq!(store.hot_keys(), vec![keys.data_key(&kind("user"), "a", 1)]);
}

#[tokio::test]
async fn tier_promotion_cold_miss_reloads_at_same_generation() {
    let (store, kv) = cached(small_config().with_max_hot(1));
    let keys = KeyScheme::new("vercache");
    let vkey = keys.version_key(&kind("user"), "a");
    let dkey = keys.data_key(&kind("user"), "a", 1);

    store
        .save(&Entity::new(kind("user")).with_id("a").with_field("n", json!(1)))
        .await
        .unwrap();
    store
        .save(&Entity::new(kind("user")).with_id("b").with_field("n", json!(2)))
        .await
        .unwrap();

    // Gone from both tiers, but the version pointer survives.
    kv.evict(&dkey);

    let loaded = store.load(&user("a")).await.unwrap().unwrap();
    assert_eq!(loaded.field("n"), Some(&json!(1)));

    let snap = store.stats();
    assert_eq!(snap.net_miss, 1);
    assert_eq!(snap.net_hit, 0);
    // Reload keeps the existing generation: no new version events.
    assert_eq!(snap.vadd, 2);
    assert_eq!(snap.vinc, 0);
    assert_eq!(kv.get(&vkey).await.unwrap(), Some(json!(1)));
    // The data key was rewritten into both tiers.
    assert_eq!(snap.set, 3);
    assert!(kv.get(&dkey).await.unwrap().is_some());

    // Next load is a hot hit again.
    store.load(&user("a")).await.unwrap().unwrap();
    assert_eq!(store.stats().hot_hit, 1);
}

#[tokio::test]
async fn tombstone_blocks_stale_cached_data() {
    let (store, _kv) = cached(small_config());

    store
        .save(&Entity::new(kind("user")).with_id("u1").with_field("a", json!(1)))
        .await
        .unwrap();
    store.remove(&user("u1")).await.unwrap();

    // The old generation is still resident in the hot tier, but the
    // tombstoned version key keeps it unreachable.
    assert_eq!(store.stats().hotsize, 1);
    let gone = store.load(&user("u1")).await.unwrap();
    assert!(gone.is_none());

    let snap = store.stats();
    assert_eq!(snap.vmiss, 1);
    assert_eq!(snap.hot_hit, 0);
    assert_eq!(snap.net_hit, 0);
}

#[tokio::test]
async fn save_after_remove_resumes_at_generation_zero() {
    let (store, kv) = cached(small_config());
    let keys = KeyScheme::new("vercache");

    store
        .save(&Entity::new(kind("user")).with_id("u1").with_field("a", json!(1)))
        .await
        .unwrap();
    store.remove(&user("u1")).await.unwrap();

    // The tombstone is a counter at -1: the next save increments it to 0.
    store
        .save(&Entity::new(kind("user")).with_id("u1").with_field("a", json!(2)))
        .await
        .unwrap();

    assert_eq!(
        kv.get(&keys.version_key(&kind("user"), "u1")).await.unwrap(),
        Some(json!(0))
    );
    let loaded = store.load(&user("u1")).await.unwrap().unwrap();
    assert_eq!(loaded.field("a"), Some(&json!(2)));

    let snap = store.stats();
    assert_eq!(snap.vinc, 1);
    assert_eq!(snap.vhit, 1);
    assert_eq!(snap.hot_hit, 1);
}

#[tokio::test]
async fn version_miss_rebuilds_from_store() {
    let (store, kv) = cached(small_config());
    let keys = KeyScheme::new("vercache");
    let vkey = keys.version_key(&kind("user"), "u1");

    store
        .save(&Entity::new(kind("user")).with_id("u1").with_field("a", json!(1)))
        .await
        .unwrap();

    // Simulate version-key expiry at the remote service.
    kv.evict(&vkey);

    let loaded = store.load(&user("u1")).await.unwrap().unwrap();
    assert_eq!(loaded.field("a"), Some(&json!(1)));

    let snap = store.stats();
    assert_eq!(snap.vmiss, 1);
    // Rebuilt as a fresh generation 1.
    assert_eq!(snap.vadd, 2);
    assert_eq!(snap.set, 2);
    assert_eq!(kv.get(&vkey).await.unwrap(), Some(json!(1)));

    // And it is cached again: next load hits hot.
    store.load(&user("u1")).await.unwrap().unwrap();
    let snap = store.stats();
    assert_eq!(snap.vhit, 1);
    assert_eq!(snap.hot_hit, 1);
}

#[tokio::test]
async fn not_found_is_never_cached() {
    let (store, kv) = cached(small_config());

    let missing = store.load(&user("ghost")).await.unwrap();
    assert!(missing.is_none());
    assert_eq!(store.stats().vmiss, 1);
    assert!(kv.is_empty());

    // A later legitimate write becomes visible.
    store
        .save(&Entity::new(kind("user")).with_id("ghost").with_field("a", json!(1)))
        .await
        .unwrap();
    let found = store.load(&user("ghost")).await.unwrap();
    assert!(found.is_some());
}

#[tokio::test]
async fn store_failure_is_not_a_cache_error() {
    let kv = Arc::new(MemoryKv::new());
    let store = CachedStore::with_config(FailingStore, kv.clone(), small_config());

    let err = store
        .save(&Entity::new(kind("user")).with_field("a", json!(1)))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::ConnectionError { .. }));

    let err = store.load(&user("u1")).await.unwrap_err();
    assert!(matches!(err, StorageError::ConnectionError { .. }));

    let snap = store.stats();
    assert_eq!(snap.cache_errs, 0);
    // No cache mutation happened along the way.
    assert_eq!(snap.set, 0);
    assert!(kv.is_empty());
}

#[tokio::test]
async fn remote_failure_during_save_counts_and_surfaces() {
    let kv = Arc::new(FlakyKv::new());
    let store = CachedStore::with_config(MemoryStore::new(), kv.clone(), small_config());

    kv.set_failing(true);
    let err = store
        .save(&Entity::new(kind("user")).with_id("u1").with_field("a", json!(1)))
        .await
        .unwrap_err();
    assert!(err.is_cache_backend());

    let snap = store.stats();
    assert_eq!(snap.cache_errs, 1);
    assert_eq!(snap.set, 0);

    // Documented partial failure: the store committed before the cache
    // step failed.
    kv.set_failing(false);
    let durable = store.inner().load(&user("u1")).await.unwrap();
    assert!(durable.is_some());
}

#[tokio::test]
async fn remote_failure_during_load_counts_and_surfaces() {
    let kv = Arc::new(FlakyKv::new());
    let store = CachedStore::with_config(MemoryStore::new(), kv.clone(), small_config());

    store
        .save(&Entity::new(kind("user")).with_id("u1").with_field("a", json!(1)))
        .await
        .unwrap();

    kv.set_failing(true);
    let err = store.load(&user("u1")).await.unwrap_err();
    assert!(err.is_cache_backend());

    let snap = store.stats();
    assert_eq!(snap.cache_errs, 1);
    // The version lookup never completed.
    assert_eq!(snap.get, 0);
}

#[tokio::test]
async fn tombstone_failure_surfaces_after_store_remove() {
    let kv = Arc::new(FlakyKv::new());
    let store = CachedStore::with_config(MemoryStore::new(), kv.clone(), small_config());

    store
        .save(&Entity::new(kind("user")).with_id("u1").with_field("a", json!(1)))
        .await
        .unwrap();

    kv.set_failing(true);
    let err = store.remove(&user("u1")).await.unwrap_err();
    assert!(err.is_cache_backend());

    let snap = store.stats();
    assert_eq!(snap.cache_errs, 1);
    assert_eq!(snap.drop, 0);

    // The store-side remove already committed.
    kv.set_failing(false);
    let durable = store.inner().load(&user("u1")).await.unwrap();
    assert!(durable.is_none());
}

#[tokio::test]
async fn bounded_hot_cache_never_exceeds_capacity() {
    let (store, _kv) = cached(small_config().with_max_hot(1));

    for i in 0..4 {
        store
            .save(
                &Entity::new(kind("user"))
                    .with_id(format!("u{i}"))
                    .with_field("n", json!(i)),
            )
            .await
            .unwrap();
        assert!(store.stats().hotsize <= 1);
    }

    let loaded = store.load(&user("u0")).await.unwrap().unwrap();
    assert_eq!(loaded.field("n"), Some(&json!(0)));

    let snap = store.stats();
    assert_eq!(snap.hot_miss, 1);
    assert_eq!(snap.net_hit, 1);
    assert_eq!(snap.hotsize, 1);
}

#[tokio::test]
async fn compound_queries_bypass_the_cache() {
    let (store, _kv) = cached(small_config());

    store
        .save(&Entity::new(kind("user")).with_id("u1").with_field("name", json!("Ada")))
        .await
        .unwrap();

    let mut fields = FieldMap::new();
    fields.insert("name".to_string(), json!("Ada"));
    let loaded = store
        .load(&EntityQuery::by_fields(kind("user"), fields.clone()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded.id.as_deref(), Some("u1"));

    // No version lookup happened for the compound load.
    let snap = store.stats();
    assert_eq!(snap.get, 0);
    assert_eq!(snap.vhit, 0);
    assert_eq!(snap.vmiss, 0);

    // Compound remove: the store applies it, but nothing is tombstoned.
    store
        .remove(&EntityQuery::by_fields(kind("user"), fields))
        .await
        .unwrap();
    assert_eq!(store.stats().drop, 0);
    assert!(store.inner().load(&user("u1")).await.unwrap().is_none());
}

#[tokio::test]
async fn allow_list_restricts_cached_kinds() {
    let config = small_config().with_kinds(vec![kind("user")]);
    let (store, kv) = cached(config);

    store
        .save(&Entity::new(kind("audit")).with_id("a1").with_field("n", json!(1)))
        .await
        .unwrap();

    // An uncached kind leaves no trace in either cache namespace.
    assert!(kv.is_empty());
    let snap = store.stats();
    assert_eq!(snap.set, 0);
    assert_eq!(snap.vadd, 0);
    assert_eq!(snap.hotsize, 0);

    let loaded = store.load(&EntityQuery::by_id(kind("audit"), "a1")).await.unwrap();
    assert!(loaded.is_some());
    assert_eq!(store.stats().get, 0);

    // Cached kinds still get the full protocol.
    store
        .save(&Entity::new(kind("user")).with_id("u1").with_field("n", json!(2)))
        .await
        .unwrap();
    assert_eq!(store.stats().vadd, 1);
}

#[tokio::test]
async fn loaded_entities_do_not_damage_cached_copies() {
    let (store, _kv) = cached(small_config());

    store
        .save(
            &Entity::new(kind("user"))
                .with_id("u1")
                .with_field("a", json!(1))
                .with_field("b", json!(2)),
        )
        .await
        .unwrap();

    let mut first = store.load(&user("u1")).await.unwrap().unwrap();
    first.set_field("c", json!(3));

    let mut second = store.load(&user("u1")).await.unwrap().unwrap();
    second.set_field("d", json!(4));

    let third = store.load(&user("u1")).await.unwrap().unwrap();
    assert_eq!(third.field("a"), Some(&json!(1)));
    assert_eq!(third.field("b"), Some(&json!(2)));
    assert!(third.field("c").is_none());
    assert!(third.field("d").is_none());
}

#[tokio::test]
async fn concurrent_saves_produce_distinct_generations() {
    use tokio::task::JoinSet;

    let kv = Arc::new(MemoryKv::new());
    let store = Arc::new(CachedStore::with_config(
        MemoryStore::new(),
        kv.clone(),
        small_config(),
    ));
    let keys = KeyScheme::new("vercache");

    // Establish the version key first so every concurrent save increments.
    store
        .save(&Entity::new(kind("user")).with_id("u1").with_field("n", json!(0)))
        .await
        .unwrap();

    let mut join_set = JoinSet::new();
    for i in 0..20 {
        let store = Arc::clone(&store);
        join_set.spawn(async move {
            store
                .save(&Entity::new(kind("user")).with_id("u1").with_field("n", json!(i)))
                .await
        });
    }
    while let Some(result) = join_set.join_next().await {
        assert!(result.unwrap().is_ok());
    }

    assert_eq!(
        kv.get(&keys.version_key(&kind("user"), "u1")).await.unwrap(),
        Some(json!(21))
    );
    let snap = store.stats();
    assert_eq!(snap.vadd, 1);
    assert_eq!(snap.vinc, 20);
}
