//! Point-in-time usage snapshot of a two-tier cache.

/// Tier occupancy plus lifetime counters.
///
/// `*_used_percent` is `size * 100 / capacity`, truncated. It can exceed 100
/// between background passes, when the MRU is allowed to overflow.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BicacheStats {
    pub mfu_size: usize,
    pub mru_size: usize,
    pub mfu_used_percent: usize,
    pub mru_used_percent: usize,

    pub hits: u64,
    pub misses: u64,
    pub promotions: u64, // into free MFU slots
    pub swaps: u64,      // MRU node displaced an MFU node
    pub evictions: u64,  // either tier
}

fn used_percent(size: usize, capacity: usize) -> usize {
    if capacity == 0 {
        return 0;
    }
    size * 100 / capacity
}

impl BicacheStats {
    pub(crate) fn new(
        mfu_size: usize,
        mfu_capacity: usize,
        mru_size: usize,
        mru_capacity: usize,
    ) -> Self {
        Self {
            mfu_size,
            mru_size,
            mfu_used_percent: used_percent(mfu_size, mfu_capacity),
            mru_used_percent: used_percent(mru_size, mru_capacity),
            ..Self::default()
        }
    }

    pub(crate) fn with_counters(
        mut self,
        hits: u64,
        misses: u64,
        promotions: u64,
        swaps: u64,
        evictions: u64,
    ) -> Self {
        self.hits = hits;
        self.misses = misses;
        self.promotions = promotions;
        self.swaps = swaps;
        self.evictions = evictions;
        self
    }

    /// Fraction of lookups that found their key, or 0.0 before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }
}
