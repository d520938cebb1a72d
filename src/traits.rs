//! # Cache Trait Hierarchy
//!
//! Policy-independent interfaces implemented by the caches in this crate.
//!
//! ## Architecture
//!
//! ```text
//!                  ┌─────────────────────────────────────────┐
//!                  │            CoreCache<K, V>              │
//!                  │                                         │
//!                  │  insert(&mut, K, V) → Option<V>         │
//!                  │  get(&mut, &K) → Option<&V>             │
//!                  │  contains(&, &K) → bool                 │
//!                  │  len(&) → usize                         │
//!                  │  is_empty(&) → bool                     │
//!                  │  capacity(&) → usize                    │
//!                  │  clear(&mut)                            │
//!                  └──────────────────┬──────────────────────┘
//!                                     │
//!                                     ▼
//!                  ┌─────────────────────────────────────────┐
//!                  │          MutableCache<K, V>             │
//!                  │  remove(&K) → Option<V>                 │
//!                  │  remove_batch(&[K])                     │
//!                  └──────────────────┬──────────────────────┘
//!                                     │
//!                                     ▼
//!                  ┌─────────────────────────────────────────┐
//!                  │          ScoredCache<K, V>              │
//!                  │  score(&K) → Option<u64>                │
//!                  │  peek(&K) → Option<&V>                  │
//!                  └─────────────────────────────────────────┘
//!
//!                  ConcurrentCache: Send + Sync marker
//! ```
//!
//! | Trait             | Implemented by                            |
//! |-------------------|-------------------------------------------|
//! | `CoreCache`       | [`BicacheCore`](crate::policy::bicache::BicacheCore) |
//! | `MutableCache`    | `BicacheCore`                             |
//! | `ScoredCache`     | `BicacheCore`                             |
//! | `ConcurrentCache` | [`Bicache`](crate::policy::bicache::Bicache) |
//!
//! `get` counts as a use and may change what a later eviction pass keeps;
//! `contains` and `peek` never do.

/// Operations every cache supports.
pub trait CoreCache<K, V> {
    /// Inserts a key-value pair, returning the previous value if it existed.
    ///
    /// ```
    /// use bicache::traits::CoreCache;
    /// use bicache::policy::bicache::BicacheCore;
    ///
    /// let mut cache = BicacheCore::try_new(2, 4).unwrap();
    /// assert_eq!(cache.insert(1, "first"), None);
    /// assert_eq!(cache.insert(1, "second"), Some("first"));
    /// ```
    fn insert(&mut self, key: K, value: V) -> Option<V>;

    /// Gets a value, recording the access.
    fn get(&mut self, key: &K) -> Option<&V>;

    /// Checks if a key exists without recording an access.
    fn contains(&self, key: &K) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of entries the cache holds once eviction has run.
    fn capacity(&self) -> usize;

    fn clear(&mut self);
}

/// Caches that allow removing an arbitrary key.
pub trait MutableCache<K, V>: CoreCache<K, V> {
    /// Removes a key, returning its value.
    fn remove(&mut self, key: &K) -> Option<V>;

    /// Removes several keys. Results line up with `keys`.
    ///
    /// ```
    /// use bicache::traits::{CoreCache, MutableCache};
    /// use bicache::policy::bicache::BicacheCore;
    ///
    /// let mut cache = BicacheCore::try_new(2, 4).unwrap();
    /// cache.insert(1, "one");
    /// cache.insert(3, "three");
    ///
    /// let removed = cache.remove_batch(&[1, 99, 3]);
    /// assert_eq!(removed, vec![Some("one"), None, Some("three")]);
    /// assert!(cache.is_empty());
    /// ```
    fn remove_batch(&mut self, keys: &[K]) -> Vec<Option<V>> {
        keys.iter().map(|k| self.remove(k)).collect()
    }
}

/// Caches that rank entries by a per-key usage score.
pub trait ScoredCache<K, V>: MutableCache<K, V> {
    /// Number of recorded uses of `key`.
    fn score(&self, key: &K) -> Option<u64>;

    /// Reads a value without counting a use.
    fn peek(&self, key: &K) -> Option<&V>;
}

/// Marker for caches that can be shared across threads by reference.
///
/// ```
/// use bicache::traits::ConcurrentCache;
/// use bicache::policy::bicache::Bicache;
///
/// fn assert_shared<C: ConcurrentCache>() {}
/// assert_shared::<Bicache<String, Vec<u8>>>();
/// ```
pub trait ConcurrentCache: Send + Sync {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::bicache::BicacheCore;

    fn fill<C: CoreCache<u32, u32>>(cache: &mut C, n: u32) {
        for i in 0..n {
            cache.insert(i, i * 2);
        }
    }

    fn hottest<C: ScoredCache<u32, u32>>(cache: &C, keys: &[u32]) -> Option<u32> {
        keys.iter()
            .copied()
            .filter(|k| cache.contains(k))
            .max_by_key(|k| cache.score(k).unwrap_or(0))
    }

    #[test]
    fn generic_insert_respects_capacity() {
        let mut cache = BicacheCore::try_new(2, 3).unwrap();
        fill(&mut cache, 20);
        assert!(cache.len() <= cache.capacity());
        assert!(!cache.is_empty());
    }

    #[test]
    fn peek_does_not_score() {
        let mut cache = BicacheCore::try_new(2, 3).unwrap();
        fill(&mut cache, 3);
        assert_eq!(ScoredCache::peek(&cache, &1), Some(&2));
        assert_eq!(ScoredCache::score(&cache, &1), Some(0));
        CoreCache::get(&mut cache, &1);
        assert_eq!(ScoredCache::score(&cache, &1), Some(1));
        assert_eq!(hottest(&cache, &[0, 1, 2]), Some(1));
    }

    #[test]
    fn generic_clear() {
        let mut cache = BicacheCore::try_new(2, 3).unwrap();
        fill(&mut cache, 4);
        CoreCache::clear(&mut cache);
        assert_eq!(CoreCache::len(&cache), 0);
        assert_eq!(cache.remove_batch(&[0, 1]), vec![None, None]);
    }
}
