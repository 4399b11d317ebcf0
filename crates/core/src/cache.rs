//! Bounded least-recently-used storage for evaluation results.

mod cached;

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use thiserror::Error;
use tracing::trace;

pub use cached::{CacheStats, CachedFunction};

use crate::repr::Vector;

/// Configuration for evaluation caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    capacity: usize,
}

/// Errors that can occur when validating a cache config.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CacheConfigError {
    #[error("cache capacity must be at least one")]
    ZeroCapacity,
}

impl Default for CacheConfig {
    fn default() -> Self {
        // Known-good value, unwrap is safe
        Self::new(10).unwrap()
    }
}

impl CacheConfig {
    /// Creates a config holding up to `capacity` entries per cache.
    ///
    /// # Errors
    ///
    /// Returns an error if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self, CacheConfigError> {
        if capacity == 0 {
            return Err(CacheConfigError::ZeroCapacity);
        }
        Ok(Self { capacity })
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Exact identity of an evaluation request.
///
/// Keys compare the bit patterns of the argument, so `0.0` and `-0.0` are
/// distinct and nearby values never share an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InputKey {
    bits: Vec<u64>,
    component: Option<usize>,
}

impl InputKey {
    #[must_use]
    pub fn new(x: &Vector) -> Self {
        Self {
            bits: x.iter().map(|v| v.to_bits()).collect(),
            component: None,
        }
    }

    /// Key for a per-component request such as a single gradient.
    #[must_use]
    pub fn with_component(x: &Vector, component: usize) -> Self {
        Self {
            component: Some(component),
            ..Self::new(x)
        }
    }
}

/// A map with bounded capacity that evicts its least-recently-used entry.
///
/// [`LruCache::get`] refreshes recency; [`LruCache::peek`] does not.
#[derive(Debug, Clone)]
pub struct LruCache<K, V> {
    capacity: usize,
    entries: HashMap<K, (V, u64)>,
    order: BTreeMap<u64, K>,
    tick: u64,
}

impl<K, V> LruCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Creates an empty cache.
    ///
    /// # Errors
    ///
    /// Returns an error if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self, CacheConfigError> {
        Ok(Self::with_config(CacheConfig::new(capacity)?))
    }

    #[must_use]
    pub fn with_config(config: CacheConfig) -> Self {
        Self {
            capacity: config.capacity(),
            entries: HashMap::with_capacity(config.capacity()),
            order: BTreeMap::new(),
            tick: 0,
        }
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    /// Returns the value for `key` and marks it most recently used.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let tick = self.next_tick();
        let (_, stamp) = self.entries.get_mut(key)?;
        let previous = std::mem::replace(stamp, tick);
        if let Some(k) = self.order.remove(&previous) {
            self.order.insert(tick, k);
        }
        self.entries.get(key).map(|(value, _)| value)
    }

    /// Returns the value for `key` without touching recency.
    #[must_use]
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.entries.get(key).map(|(value, _)| value)
    }

    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Inserts or replaces `key`, evicting the least-recently-used entry when
    /// the cache is full. Returns the evicted key, if any.
    pub fn put(&mut self, key: K, value: V) -> Option<K> {
        let tick = self.next_tick();
        if let Some((slot, stamp)) = self.entries.get_mut(&key) {
            *slot = value;
            let previous = std::mem::replace(stamp, tick);
            self.order.remove(&previous);
            self.order.insert(tick, key);
            return None;
        }

        let evicted = if self.entries.len() >= self.capacity {
            self.evict_one()
        } else {
            None
        };
        self.order.insert(tick, key.clone());
        self.entries.insert(key, (value, tick));
        evicted
    }

    fn evict_one(&mut self) -> Option<K> {
        let (_, key) = self.order.pop_first()?;
        self.entries.remove(&key);
        trace!(remaining = self.entries.len(), "evicted least recently used entry");
        Some(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Changes the capacity, evicting the oldest entries if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if `capacity` is zero.
    pub fn resize(&mut self, capacity: usize) -> Result<(), CacheConfigError> {
        self.capacity = CacheConfig::new(capacity)?.capacity();
        while self.entries.len() > self.capacity {
            self.evict_one();
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ndarray::array;
    use proptest::prelude::*;

    #[test]
    fn evicts_least_recently_used() {
        let mut cache = LruCache::new(2).unwrap();
        cache.put("a", 1);
        cache.put("b", 2);

        assert_eq!(cache.put("c", 3), Some("a"));
        assert!(!cache.contains(&"a"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn get_protects_from_eviction() {
        let mut cache = LruCache::new(2).unwrap();
        cache.put("a", 1);
        cache.put("b", 2);
        assert_eq!(cache.get(&"a"), Some(&1));

        assert_eq!(cache.put("c", 3), Some("b"));
        assert!(cache.contains(&"a"));
    }

    #[test]
    fn peek_does_not_refresh() {
        let mut cache = LruCache::new(2).unwrap();
        cache.put("a", 1);
        cache.put("b", 2);
        assert_eq!(cache.peek(&"a"), Some(&1));

        assert_eq!(cache.put("c", 3), Some("a"));
    }

    #[test]
    fn put_replaces_existing_value() {
        let mut cache = LruCache::new(2).unwrap();
        cache.put("a", 1);
        cache.put("b", 2);
        assert_eq!(cache.put("a", 10), None);

        assert_eq!(cache.put("c", 3), Some("b"));
        assert_eq!(cache.peek(&"a"), Some(&10));
    }

    #[test]
    fn resize_and_clear() {
        let mut cache = LruCache::new(3).unwrap();
        for (k, v) in [("a", 1), ("b", 2), ("c", 3)] {
            cache.put(k, v);
        }
        cache.resize(1).unwrap();
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&"c"));

        assert_eq!(cache.resize(0), Err(CacheConfigError::ZeroCapacity));
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn keys_use_exact_bits() {
        let a = InputKey::new(&array![0.0, 1.0]);
        let b = InputKey::new(&array![-0.0, 1.0]);
        let c = InputKey::new(&array![0.0, 1.0 + f64::EPSILON]);

        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, InputKey::new(&array![0.0, 1.0]));
        assert_ne!(a, InputKey::with_component(&array![0.0, 1.0], 0));
        assert_eq!(CacheConfig::default().capacity(), 10);
    }

    proptest! {
        #[test]
        fn never_exceeds_capacity(
            capacity in 1usize..8,
            keys in proptest::collection::vec(0u8..16, 0..64),
        ) {
            let mut cache = LruCache::new(capacity).unwrap();
            for key in keys {
                cache.put(key, ());
                prop_assert!(cache.len() <= capacity);
                prop_assert!(cache.contains(&key));
            }
        }

        #[test]
        fn overflow_evicts_exactly_the_oldest(capacity in 1usize..8) {
            let mut cache = LruCache::new(capacity).unwrap();
            for key in 0..capacity {
                cache.put(key, key);
            }
            prop_assert_eq!(cache.put(capacity, capacity), Some(0));
            for key in 1..=capacity {
                prop_assert!(cache.contains(&key));
            }
        }
    }
}
