//! Builder for two-tier caches.
//!
//! Hides the config plumbing: set capacities and the eviction mode, then
//! build either the single-threaded [`BicacheCore`] or the shared [`Bicache`].
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use bicache::builder::BicacheBuilder;
//!
//! let cache = BicacheBuilder::new()
//!     .mfu_capacity(100)
//!     .mru_capacity(400)
//!     .auto_evict(Duration::from_secs(1))
//!     .build::<u64, String>();
//! cache.set(1, "hello".to_string());
//! assert_eq!(cache.get(&1), Some("hello".to_string()));
//! ```

use std::hash::Hash;
use std::time::Duration;

use crate::config::BicacheConfig;
use crate::error::ConfigError;
use crate::policy::bicache::{Bicache, BicacheCore};

/// Builder for [`Bicache`] and [`BicacheCore`]. Starts from
/// [`BicacheConfig::default`].
#[derive(Debug, Clone, Default)]
pub struct BicacheBuilder {
    config: BicacheConfig,
}

impl BicacheBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: BicacheConfig) -> Self {
        Self { config }
    }

    pub fn mfu_capacity(mut self, capacity: usize) -> Self {
        self.config.mfu_size = capacity;
        self
    }

    pub fn mru_capacity(mut self, capacity: usize) -> Self {
        self.config.mru_size = capacity;
        self
    }

    /// Runs the promotion/eviction pass in the background every `interval`.
    /// `Duration::ZERO` switches back to inline eviction; sub-millisecond
    /// intervals round up to 1 ms.
    pub fn auto_evict(mut self, interval: Duration) -> Self {
        self.config.auto_evict_ms = if interval.is_zero() {
            0
        } else {
            u64::try_from(interval.as_millis()).unwrap_or(u64::MAX).max(1)
        };
        self
    }

    pub fn config(&self) -> &BicacheConfig {
        &self.config
    }

    /// Builds the single-threaded core. No thread is spawned, so a non-zero
    /// auto-evict interval only disables inline eviction.
    pub fn try_build_core<K, V>(&self) -> Result<BicacheCore<K, V>, ConfigError>
    where
        K: Clone + Eq + Hash,
    {
        BicacheCore::with_config(&self.config)
    }

    /// Builds the shared cache, starting the background evictor if configured.
    pub fn try_build<K, V>(&self) -> Result<Bicache<K, V>, ConfigError>
    where
        K: Clone + Eq + Hash + Send + 'static,
        V: Send + 'static,
    {
        Bicache::with_config(&self.config)
    }

    /// Like [`try_build`](Self::try_build), panicking on an invalid config.
    ///
    /// # Panics
    ///
    /// If either capacity is zero.
    pub fn build<K, V>(&self) -> Bicache<K, V>
    where
        K: Clone + Eq + Hash + Send + 'static,
        V: Send + 'static,
    {
        match self.try_build() {
            Ok(cache) => cache,
            Err(err) => panic!("invalid bicache configuration: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::bicache::Tier;
    use crate::traits::CoreCache;

    #[test]
    fn builder_sets_capacities() {
        let core = BicacheBuilder::new()
            .mfu_capacity(3)
            .mru_capacity(7)
            .try_build_core::<u64, u64>()
            .unwrap();
        assert_eq!(core.mfu_capacity(), 3);
        assert_eq!(core.mru_capacity(), 7);
        assert_eq!(core.capacity(), 10);
        assert!(core.evicts_inline());
    }

    #[test]
    fn auto_evict_disables_inline_pass() {
        let mut core = BicacheBuilder::new()
            .mfu_capacity(1)
            .mru_capacity(1)
            .auto_evict(Duration::from_millis(50))
            .try_build_core::<u64, u64>()
            .unwrap();
        assert!(!core.evicts_inline());
        core.set(1, 1);
        core.set(2, 2);
        assert_eq!(core.mru_len(), 2);
        core.promote_evict();
        assert_eq!(core.mru_len(), 1);
    }

    #[test]
    fn auto_evict_rounding() {
        let builder = BicacheBuilder::new().auto_evict(Duration::from_micros(10));
        assert_eq!(builder.config().auto_evict_ms, 1);
        let builder = builder.auto_evict(Duration::ZERO);
        assert_eq!(builder.config().auto_evict_ms, 0);
    }

    #[test]
    fn invalid_capacity_is_an_error() {
        let err = BicacheBuilder::new()
            .mfu_capacity(0)
            .try_build::<u64, u64>()
            .unwrap_err();
        assert!(err.message().contains("mfu"));
    }

    #[test]
    #[should_panic(expected = "invalid bicache configuration")]
    fn build_panics_on_invalid_config() {
        let _ = BicacheBuilder::new().mru_capacity(0).build::<u64, u64>();
    }

    #[test]
    fn from_config_round_trip() {
        let config = BicacheConfig {
            mfu_size: 1,
            mru_size: 2,
            auto_evict_ms: 0,
        };
        let cache = BicacheBuilder::from_config(config).build::<&'static str, u8>();
        cache.set("a", 1);
        cache.get(&"a");
        cache.set("b", 2);
        cache.set("c", 3);
        assert_eq!(cache.tier_of(&"a"), Some(Tier::Mfu));
        assert_eq!(cache.len(), 3);
    }
}
