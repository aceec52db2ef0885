//! # Bounded LRU Cache
//!
//! Thread-safe, cloneable least-recently-used cache shared by the schema store
//! and the catalog. Clones share the same underlying map.
//!
//! The lock is `parking_lot::Mutex` rather than an `RwLock`: every `get`
//! reorders the recency list, so reads mutate too. The lock is never held
//! across I/O or `.await` points.

use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;

/// A bounded cache with least-recently-used eviction and no time-based expiry.
#[derive(Debug)]
pub struct BoundedCache<K: Hash + Eq, V> {
    entries: Arc<Mutex<LruCache<K, V>>>,
}

impl<K: Hash + Eq, V> Clone for BoundedCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<K: Hash + Eq, V: Clone> BoundedCache<K, V> {
    /// Create a cache holding at most `capacity` entries. Zero is clamped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    /// Return a clone of the cached value and mark it most recently used.
    pub fn get(&self, key: &K) -> Option<V> {
        self.entries.lock().get(key).cloned()
    }

    /// Insert a value, returning the entry evicted to make room, if any.
    ///
    /// Re-inserting an existing key replaces its value without evicting
    /// anything else.
    pub fn insert(&self, key: K, value: V) -> Option<(K, V)> {
        let mut guard = self.entries.lock();
        if guard.contains(&key) {
            guard.put(key, value);
            return None;
        }
        guard.push(key, value)
    }

    /// Whether `key` is cached. Does not affect recency.
    pub fn contains(&self, key: &K) -> bool {
        self.entries.lock().contains(key)
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.entries.lock().cap().get()
    }
}
