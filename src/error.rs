//! Failures reported by value.
//!
//! Two things can go wrong without a bug being involved: a cache built with a
//! tier that can hold nothing ([`ConfigError`]), and a consistency walk that
//! finds the recency links, the score index and the key directory telling
//! different stories ([`InvariantError`]). Misusing a list handle, such as
//! reading through a handle from another list or removing a node twice, is a
//! bug in the caller and panics where it happens.
//!
//! ```
//! use bicache::builder::BicacheBuilder;
//!
//! let bad = BicacheBuilder::new().mru_capacity(0).try_build_core::<String, i32>();
//! assert_eq!(bad.unwrap_err().message(), "mru capacity must be > 0");
//! ```

use std::fmt;

/// A `check_invariants` walk found the list or directory inconsistent.
///
/// See [`ScoredList::check_invariants`](crate::ds::ScoredList::check_invariants)
/// and [`BicacheCore::check_invariants`](crate::policy::bicache::BicacheCore::check_invariants).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// What the walk tripped over.
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvariantError {}

/// A [`BicacheConfig`](crate::config::BicacheConfig) the cache cannot run
/// with, or an evictor thread that failed to start.
///
/// ```
/// use bicache::config::BicacheConfig;
///
/// let err = BicacheConfig { mfu_size: 0, mru_size: 8, auto_evict_ms: 0 }
///     .validate()
///     .unwrap_err();
/// assert!(err.to_string().contains("capacity"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(String);

impl ConfigError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    pub(crate) fn zero_capacity(tier: &str) -> Self {
        Self(format!("{tier} capacity must be > 0"))
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invariant_error_displays_its_message() {
        let err = InvariantError::new("score index holds 3 nodes, arena holds 4");
        assert_eq!(err.to_string(), "score index holds 3 nodes, arena holds 4");
        assert_eq!(err.message(), "score index holds 3 nodes, arena holds 4");
    }

    #[test]
    fn zero_capacity_names_the_tier() {
        let err = ConfigError::zero_capacity("mfu");
        assert_eq!(err.message(), "mfu capacity must be > 0");
        assert_eq!(err, ConfigError::new("mfu capacity must be > 0"));
    }

    #[test]
    fn both_errors_box_as_std_error() {
        let boxed: Vec<Box<dyn std::error::Error + Send + Sync>> = vec![
            Box::new(InvariantError::new("dangling handle")),
            Box::new(ConfigError::zero_capacity("mru")),
        ];
        assert_eq!(boxed[0].to_string(), "dangling handle");
        assert!(boxed[1].to_string().starts_with("mru"));
    }
}
