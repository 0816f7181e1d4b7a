//! Versioned two-tier caching middleware for entity stores.
//!
//! `vercache` wraps a persistent entity store with a read-through/
//! write-through cache built from two tiers (a bounded in-process LRU and
//! a shared remote key-value service) kept consistent by a per-entity
//! generation counter instead of invalidation broadcasts. Every save moves
//! the version pointer forward and writes a fresh, generation-addressed
//! data key; every cached read checks the pointer first, so data from a
//! superseded generation is simply never looked up.
//!
//! The entry point is [`CachedStore`], a decorator implementing the same
//! [`EntityStore`] trait as the store it wraps.

pub mod cached;
pub mod cold;
pub mod config;
pub mod hot;
pub mod keys;
pub mod stats;
pub mod version;

pub use cached::CachedStore;
pub use cold::ColdCache;
pub use config::CacheConfig;
pub use hot::HotCache;
pub use keys::KeyScheme;
pub use stats::{CacheStats, StatsSnapshot};
pub use version::{Version, VersionStore};

pub use vercache_core::{CoreError, Entity, EntityKind, FieldMap};
pub use vercache_kv::{KvError, KvService, MemoryKv};
pub use vercache_storage::{EntityQuery, EntityStore, QueryFilter, StorageError};
