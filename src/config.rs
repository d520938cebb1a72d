//! Configuration for a two-tier cache.
//!
//! # Example
//!
//! ```
//! use bicache::config::BicacheConfig;
//!
//! let config = BicacheConfig::default();
//! assert_eq!(config.auto_evict_ms, 0);
//! assert!(config.validate().is_ok());
//!
//! let config = BicacheConfig {
//!     mfu_size: 10,
//!     mru_size: 30,
//!     auto_evict_ms: 1_000,
//! };
//! assert_eq!(config.auto_evict_interval().map(|d| d.as_secs()), Some(1));
//! ```

use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Tier capacities and eviction mode.
///
/// Capacities count keys, not bytes. An `auto_evict_ms` of 0 makes every
/// write run the promotion/eviction pass inline; anything else runs it on a
/// background thread at that interval.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BicacheConfig {
    /// Maximum keys in the frequently-used tier.
    #[serde(default = "default_mfu_size")]
    pub mfu_size: usize,

    /// Maximum keys in the recently-used tier.
    #[serde(default = "default_mru_size")]
    pub mru_size: usize,

    /// Background pass interval in milliseconds (0 = inline on every set)
    #[serde(default)]
    pub auto_evict_ms: u64,
}

fn default_mfu_size() -> usize { 256 }
fn default_mru_size() -> usize { 1024 }

impl Default for BicacheConfig {
    fn default() -> Self {
        Self {
            mfu_size: default_mfu_size(),
            mru_size: default_mru_size(),
            auto_evict_ms: 0,
        }
    }
}

impl BicacheConfig {
    /// Rejects tiers that could never hold a key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mfu_size == 0 {
            return Err(ConfigError::zero_capacity("mfu"));
        }
        if self.mru_size == 0 {
            return Err(ConfigError::zero_capacity("mru"));
        }
        Ok(())
    }

    /// The background interval, or `None` when eviction runs inline.
    pub fn auto_evict_interval(&self) -> Option<Duration> {
        (self.auto_evict_ms > 0).then(|| Duration::from_millis(self.auto_evict_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid_and_inline() {
        let config = BicacheConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.auto_evict_interval(), None);
    }

    #[test]
    fn zero_tiers_fail_validation() {
        let mut config = BicacheConfig::default();
        config.mru_size = 0;
        assert_eq!(config.validate().unwrap_err().message(), "mru capacity must be > 0");

        let mut config = BicacheConfig::default();
        config.mfu_size = 0;
        assert_eq!(config.validate().unwrap_err().message(), "mfu capacity must be > 0");
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: BicacheConfig =
            serde_json::from_str(r#"{ "mfu_size": 10, "mru_size": 30 }"#).unwrap();
        assert_eq!(config.mfu_size, 10);
        assert_eq!(config.mru_size, 30);
        assert_eq!(config.auto_evict_ms, 0);

        let config: BicacheConfig = serde_json::from_str(r#"{ "auto_evict_ms": 250 }"#).unwrap();
        assert_eq!(config.mfu_size, 256);
        assert_eq!(config.auto_evict_interval(), Some(Duration::from_millis(250)));
    }
}
