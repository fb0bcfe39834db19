use crate::key::CacheKey;
use forge_catalog::CatalogSlice;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use time::UtcDateTime;

/// Default number of catalog slices kept before the least recently used one
/// is evicted.
pub const DEFAULT_CAPACITY: usize = 16;

/// A cached slice and when it was stored.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub slice: Arc<CatalogSlice>,
    pub created_at: UtcDateTime,
}

/// Counters since the cache was created (not reset by [`CatalogCache::clear_all`]).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

struct Slot {
    entry: CacheEntry,
    last_used: u64,
}

#[derive(Default)]
struct Inner {
    slots: HashMap<CacheKey, Slot>,
    /// Logical clock for LRU ordering; bumped on every get/put.
    clock: u64,
    stats: CacheStats,
}
impl Inner {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn evict_lru(&mut self) {
        let oldest = self.slots.iter().min_by_key(|(_, slot)| slot.last_used).map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            self.slots.remove(&key);
            self.stats.evictions += 1;
            tracing::debug!(key = %key, "Evicted least recently used catalog slice");
        }
    }
}

/// Process-lifetime store of catalog slices, keyed by module.
///
/// Slices are stored behind an [`Arc`] and replaced in a single assignment,
/// so a reader either sees the previous slice or the new one, never a mix.
/// Callers should re-request the slice each time they need it instead of
/// holding on to the `Arc`, otherwise they can keep serving data that has
/// since been invalidated.
///
/// Methods take `&self`; the lock is never held across an `.await`.
pub struct CatalogCache {
    inner: Mutex<Inner>,
    capacity: usize,
}

impl CatalogCache {
    /// Create a cache holding at most `capacity` slices (minimum of one).
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            capacity: capacity.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Nothing panics while holding the lock, but if something ever does
        // the map itself is still consistent.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up a slice. Never triggers a fetch.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<CatalogSlice>> {
        let mut inner = self.lock();
        let now = inner.tick();
        let found = inner.slots.get_mut(key).map(|slot| {
            slot.last_used = now;
            Arc::clone(&slot.entry.slice)
        });
        match found {
            Some(_) => inner.stats.hits += 1,
            None => inner.stats.misses += 1,
        }
        tracing::trace!(key = %key, hit = found.is_some(), "Catalog cache lookup");
        found
    }

    /// The stored entry including its timestamp, without counting as a use.
    pub fn entry(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.lock().slots.get(key).map(|slot| slot.entry.clone())
    }

    /// Store a slice, replacing whatever was stored under `key`. Never merges.
    ///
    /// Returns the stored slice.
    pub fn put(&self, key: CacheKey, slice: CatalogSlice) -> Arc<CatalogSlice> {
        let slice = Arc::new(slice);
        let mut inner = self.lock();
        if !inner.slots.contains_key(&key) && inner.slots.len() >= self.capacity {
            inner.evict_lru();
        }
        let last_used = inner.tick();
        let entry = CacheEntry {
            slice: Arc::clone(&slice),
            created_at: UtcDateTime::now(),
        };
        tracing::debug!(key = %key, packs = slice.packs.len(), assets = slice.assets.len(), "Cached catalog slice");
        inner.slots.insert(key, Slot { entry, last_used });
        slice
    }

    /// Drop the slice stored under `key`. Returns whether there was one.
    pub fn invalidate(&self, key: &CacheKey) -> bool {
        let removed = self.lock().slots.remove(key).is_some();
        if removed {
            tracing::debug!(key = %key, "Invalidated catalog slice");
        }
        removed
    }

    /// Drop every slice whose key matches `predicate`. Returns how many.
    pub fn invalidate_where(&self, mut predicate: impl FnMut(&CacheKey) -> bool) -> usize {
        let mut inner = self.lock();
        let before = inner.slots.len();
        inner.slots.retain(|key, _| !predicate(key));
        before - inner.slots.len()
    }

    /// Drop everything. Called once at the start of every session.
    pub fn clear_all(&self) {
        let mut inner = self.lock();
        let dropped = inner.slots.len();
        inner.slots.clear();
        tracing::debug!(dropped, "Cleared catalog cache");
    }

    pub fn len(&self) -> usize {
        self.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        CacheStats {
            entries: inner.slots.len(),
            ..inner.stats
        }
    }
}
impl Default for CatalogCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
