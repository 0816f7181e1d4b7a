//! Process-lifetime cache statistics.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use time::OffsetDateTime;
use vercache_core::now_utc;

/// Monotonic operation counters for one cache instance.
///
/// Each counter is incremented exactly once per corresponding protocol
/// event. Counters are owned by one [`CachedStore`](crate::CachedStore);
/// independent instances never share them.
#[derive(Debug)]
pub struct CacheStats {
    start: OffsetDateTime,
    set: AtomicU64,
    get: AtomicU64,
    vinc: AtomicU64,
    vadd: AtomicU64,
    vmiss: AtomicU64,
    vhit: AtomicU64,
    hot_hit: AtomicU64,
    net_hit: AtomicU64,
    hot_miss: AtomicU64,
    net_miss: AtomicU64,
    drop: AtomicU64,
    cache_errs: AtomicU64,
}

impl CacheStats {
    pub(crate) fn new() -> Self {
        Self {
            start: now_utc(),
            set: AtomicU64::new(0),
            get: AtomicU64::new(0),
            vinc: AtomicU64::new(0),
            vadd: AtomicU64::new(0),
            vmiss: AtomicU64::new(0),
            vhit: AtomicU64::new(0),
            hot_hit: AtomicU64::new(0),
            net_hit: AtomicU64::new(0),
            hot_miss: AtomicU64::new(0),
            net_miss: AtomicU64::new(0),
            drop: AtomicU64::new(0),
            cache_errs: AtomicU64::new(0),
        }
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// A data entry was written to the cold tier.
    pub(crate) fn record_set(&self) {
        Self::bump(&self.set);
    }

    /// A version key was looked up during a load.
    pub(crate) fn record_get(&self) {
        Self::bump(&self.get);
    }

    /// An existing version key was incremented.
    pub(crate) fn record_vinc(&self) {
        Self::bump(&self.vinc);
    }

    /// A version key was created.
    pub(crate) fn record_vadd(&self) {
        Self::bump(&self.vadd);
    }

    /// A load found the version key absent or tombstoned.
    pub(crate) fn record_vmiss(&self) {
        Self::bump(&self.vmiss);
    }

    /// A load found a current generation.
    pub(crate) fn record_vhit(&self) {
        Self::bump(&self.vhit);
    }

    pub(crate) fn record_hot_hit(&self) {
        Self::bump(&self.hot_hit);
    }

    pub(crate) fn record_hot_miss(&self) {
        Self::bump(&self.hot_miss);
    }

    pub(crate) fn record_net_hit(&self) {
        Self::bump(&self.net_hit);
    }

    pub(crate) fn record_net_miss(&self) {
        Self::bump(&self.net_miss);
    }

    /// A version key was tombstoned after a remove.
    pub(crate) fn record_drop(&self) {
        Self::bump(&self.drop);
    }

    /// The remote service failed during a version or data operation.
    /// Persistent-store failures are never counted here.
    pub(crate) fn record_cache_err(&self) {
        Self::bump(&self.cache_errs);
    }

    /// Takes a point-in-time snapshot.
    #[must_use]
    pub fn snapshot(&self, hotsize: usize) -> StatsSnapshot {
        StatsSnapshot {
            start: self.start,
            end: now_utc(),
            set: self.set.load(Ordering::Relaxed),
            get: self.get.load(Ordering::Relaxed),
            vinc: self.vinc.load(Ordering::Relaxed),
            vadd: self.vadd.load(Ordering::Relaxed),
            vmiss: self.vmiss.load(Ordering::Relaxed),
            vhit: self.vhit.load(Ordering::Relaxed),
            hot_hit: self.hot_hit.load(Ordering::Relaxed),
            net_hit: self.net_hit.load(Ordering::Relaxed),
            hot_miss: self.hot_miss.load(Ordering::Relaxed),
            net_miss: self.net_miss.load(Ordering::Relaxed),
            drop: self.drop.load(Ordering::Relaxed),
            cache_errs: self.cache_errs.load(Ordering::Relaxed),
            hotsize,
        }
    }
}

/// A point-in-time view of the counters, plus derived fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// When this cache instance was created.
    #[serde(with = "time::serde::rfc3339")]
    pub start: OffsetDateTime,
    /// When the snapshot was taken.
    #[serde(with = "time::serde::rfc3339")]
    pub end: OffsetDateTime,
    /// Cold-tier data writes.
    pub set: u64,
    /// Version-key lookups on load.
    pub get: u64,
    /// Version increments (updates of existing entities).
    pub vinc: u64,
    /// Version creations (first saves and load-rebuilds).
    pub vadd: u64,
    /// Loads that found no current generation.
    pub vmiss: u64,
    /// Loads that found a current generation.
    pub vhit: u64,
    /// Hot-tier hits.
    pub hot_hit: u64,
    /// Cold-tier hits.
    pub net_hit: u64,
    /// Hot-tier misses.
    pub hot_miss: u64,
    /// Cold-tier misses.
    pub net_miss: u64,
    /// Tombstones written after removes.
    pub drop: u64,
    /// Remote-service failures seen by this layer.
    pub cache_errs: u64,
    /// Hot-tier occupancy at snapshot time.
    pub hotsize: usize,
}
