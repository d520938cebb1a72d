//! # Two-Tier MRU/MFU Cache
//!
//! Combines a recently-used tier (MRU) and a frequently-used tier (MFU), each a
//! capacity-bounded [`ScoredList`]. Every read bumps the entry's score; a
//! promotion/eviction pass moves the best MRU scorers into the MFU when the MRU
//! overflows.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────────────┐
//!   │                         BicacheCore<K, V>                                │
//!   │                                                                          │
//!   │   directory: FxHashMap<K, Entry>                                         │
//!   │   ┌─────────┬──────────────────────────┐                                 │
//!   │   │   Key   │  Entry { handle, tier }  │                                 │
//!   │   ├─────────┼──────────────────────────┤                                 │
//!   │   │ "a"     │  (h_3, Mru)              │──────┐                          │
//!   │   │ "b"     │  (h_1, Mfu)              │──┐   │                          │
//!   │   └─────────┴──────────────────────────┘  │   │                          │
//!   │                                           ▼   ▼                          │
//!   │   mfu: ScoredList<Record<K, V>>     mru: ScoredList<Record<K, V>>        │
//!   │   ┌──────────────────────────┐      ┌──────────────────────────┐         │
//!   │   │ [b:9] ─ [d:7] ─ [e:5]    │ ◄─── │ [a:3] ─ [c:0] ─ [f:0]    │         │
//!   │   └──────────────────────────┘ promote └────────────────────────┘        │
//!   │                                                                          │
//!   │   mru_cap, mfu_cap, inline_evict                                         │
//!   └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Promotion / Eviction Pass
//!
//! ```text
//!   overflow = mru.len - mru_cap            (nothing to do if ≤ 0)
//!   top_mru  = mru.high_scores(overflow)    ascending
//!   free     = mfu_cap - mfu.len
//!
//!   1. promote the min(free, overflow) highest of top_mru into the MFU
//!   2. pair the rest (highest first) with mfu.low_scores (lowest first):
//!        mru score >  mfu score  → evict the MFU occupant, promote the MRU node
//!        otherwise               → stop pairing
//!   3. evict whatever is left of top_mru
//!   4. evict MFU lowest scorers while mfu.len > mfu_cap
//! ```
//!
//! Promotion detaches the node from the MRU arena and relinks it at the MFU
//! tail with its score; the directory entry is rewritten in the same call, so
//! no caller can see a key in both tiers or in neither.
//!
//! ## Thread Safety
//!
//! - [`BicacheCore`]: not thread-safe; every operation takes `&mut self`
//!   because `get` mutates scores
//! - [`Bicache`]: one `parking_lot::Mutex` around the whole core, plus an
//!   optional background evictor that is stopped before the core is dropped

use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::config::BicacheConfig;
use crate::ds::{ScoredHandle, ScoredList};
use crate::error::{ConfigError, InvariantError};
use crate::evictor::AutoEvictor;
use crate::stats::BicacheStats;
use crate::traits::{ConcurrentCache, CoreCache, MutableCache, ScoredCache};

/// Tier that currently owns a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// Recently used: every new key starts here.
    Mru,
    /// Frequently used: only reachable through promotion.
    Mfu,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Mru => f.write_str("mru"),
            Tier::Mfu => f.write_str("mfu"),
        }
    }
}

/// Directory entry: where the key's node lives.
#[derive(Debug, Clone, Copy)]
struct Entry {
    handle: ScoredHandle,
    tier: Tier,
}

#[derive(Debug)]
struct Record<K, V> {
    key: K,
    value: V,
}

/// What a single [`BicacheCore::promote_evict`] pass did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PromoteEvictReport {
    /// MRU nodes moved into free MFU slots.
    pub promoted: usize,
    /// MRU nodes that displaced a lower-scoring MFU occupant.
    pub swapped: usize,
    /// MRU nodes evicted outright.
    pub evicted_mru: usize,
    /// MFU nodes evicted, either displaced by a swap or trimmed for capacity.
    pub evicted_mfu: usize,
}

impl PromoteEvictReport {
    /// Returns `true` if the pass changed nothing.
    pub fn is_noop(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Counters {
    hits: u64,
    misses: u64,
    promotions: u64,
    swaps: u64,
    evictions: u64,
}

/// Upper bound on slots reserved per tier at construction; larger tiers grow
/// on demand.
const PREALLOC_LIMIT: usize = 1024;

#[cold]
#[track_caller]
fn directory_violation(tier: Tier, detail: &str) -> ! {
    panic!("key directory out of sync with {tier} list: {detail}")
}

/// Single-threaded two-tier cache engine.
///
/// # Example
///
/// ```
/// use bicache::policy::bicache::{BicacheCore, Tier};
///
/// let mut cache = BicacheCore::try_new(2, 3).unwrap();
/// for key in 0..3 {
///     cache.set(key, key * 10);
/// }
/// // Key 1 is hot.
/// cache.get(&1);
/// cache.get(&1);
///
/// // The 4th key overflows the MRU; the inline pass promotes the top scorer.
/// cache.set(3, 30);
/// assert_eq!(cache.mru_len(), 3);
/// assert_eq!(cache.tier_of(&1), Some(Tier::Mfu));
/// assert_eq!(cache.score(&1), Some(2));
/// ```
pub struct BicacheCore<K, V> {
    directory: FxHashMap<K, Entry>,
    mru: ScoredList<Record<K, V>>,
    mfu: ScoredList<Record<K, V>>,
    mru_cap: usize,
    mfu_cap: usize,
    inline_evict: bool,
    counters: Counters,
}

impl<K, V> BicacheCore<K, V>
where
    K: Clone + Eq + Hash,
{
    /// Creates a core that runs a promotion/eviction pass after every `set`.
    ///
    /// Both capacities count keys and must be non-zero.
    pub fn try_new(mfu_capacity: usize, mru_capacity: usize) -> Result<Self, ConfigError> {
        Self::with_config(&BicacheConfig {
            mfu_size: mfu_capacity,
            mru_size: mru_capacity,
            auto_evict_ms: 0,
        })
    }

    /// Creates a core from a validated config.
    ///
    /// A non-zero `auto_evict_ms` turns off inline eviction: the caller (or
    /// [`Bicache`]) is then responsible for calling
    /// [`promote_evict`](Self::promote_evict).
    pub fn with_config(config: &BicacheConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            directory: FxHashMap::with_capacity_and_hasher(
                config
                    .mfu_size
                    .saturating_add(config.mru_size)
                    .min(2 * PREALLOC_LIMIT),
                Default::default(),
            ),
            mru: ScoredList::with_capacity(config.mru_size.min(PREALLOC_LIMIT)),
            mfu: ScoredList::with_capacity(config.mfu_size.min(PREALLOC_LIMIT)),
            mru_cap: config.mru_size,
            mfu_cap: config.mfu_size,
            inline_evict: config.auto_evict_ms == 0,
            counters: Counters::default(),
        })
    }

    /// Looks up `key` and bumps its score. No tier change happens here.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let Some(entry) = self.directory.get(key).copied() else {
            self.counters.misses += 1;
            return None;
        };
        self.counters.hits += 1;
        Some(&self.list_mut(entry.tier).read(entry.handle).value)
    }

    /// Inserts or updates `key`, returning the replaced value.
    ///
    /// An update keeps the node, its tier and its score. A new key is pushed
    /// to the MRU tail with score 0. With inline eviction the pass runs
    /// before this returns.
    pub fn set(&mut self, key: K, value: V) -> Option<V> {
        let previous = match self.directory.get(&key).copied() {
            Some(entry) => {
                let record = self
                    .list_mut(entry.tier)
                    .peek_mut(entry.handle)
                    .unwrap_or_else(|| directory_violation(entry.tier, "dangling handle on set"));
                Some(std::mem::replace(&mut record.value, value))
            },
            None => {
                let handle = self.mru.push_tail(Record {
                    key: key.clone(),
                    value,
                });
                self.directory.insert(
                    key,
                    Entry {
                        handle,
                        tier: Tier::Mru,
                    },
                );
                None
            },
        };

        if self.inline_evict {
            self.promote_evict();
        }
        previous
    }

    /// Runs one promotion/eviction pass. A no-op while the MRU is within
    /// capacity and the MFU is within capacity.
    pub fn promote_evict(&mut self) -> PromoteEvictReport {
        let mut report = PromoteEvictReport::default();

        let overflow = self.mru.len().saturating_sub(self.mru_cap);
        if overflow > 0 {
            let top_mru = self.mru.high_scores(overflow);
            let mfu_free = self.mfu_cap.saturating_sub(self.mfu.len());
            let can_promote = mfu_free.min(top_mru.len());
            let (remaining, promotable) = top_mru.split_at(top_mru.len() - can_promote);

            for &handle in promotable {
                self.promote(handle);
                report.promoted += 1;
            }

            if !remaining.is_empty() {
                let bottom_mfu = self.mfu.low_scores(remaining.len());
                let mut unresolved = remaining.len();
                for (&candidate, &occupant) in remaining.iter().rev().zip(&bottom_mfu) {
                    if self.score_in(Tier::Mru, candidate) <= self.score_in(Tier::Mfu, occupant) {
                        break;
                    }
                    self.evict(Tier::Mfu, occupant);
                    report.evicted_mfu += 1;
                    self.promote(candidate);
                    report.swapped += 1;
                    unresolved -= 1;
                }

                for &handle in &remaining[..unresolved] {
                    self.evict(Tier::Mru, handle);
                    report.evicted_mru += 1;
                }
            }
        }

        let mfu_overflow = self.mfu.len().saturating_sub(self.mfu_cap);
        if mfu_overflow > 0 {
            for handle in self.mfu.low_scores(mfu_overflow) {
                self.evict(Tier::Mfu, handle);
                report.evicted_mfu += 1;
            }
        }

        self.counters.promotions += report.promoted as u64;
        self.counters.swaps += report.swapped as u64;

        if !report.is_noop() {
            debug!(
                promoted = report.promoted,
                swapped = report.swapped,
                evicted_mru = report.evicted_mru,
                evicted_mfu = report.evicted_mfu,
                mru_len = self.mru.len(),
                mfu_len = self.mfu.len(),
                "promote/evict pass"
            );
        }
        report
    }

    /// Removes `key` from whichever tier owns it.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let entry = self.directory.remove(key)?;
        let record = self.list_mut(entry.tier).remove(entry.handle).into_value();
        Some(record.value)
    }

    /// Checks membership without touching the score.
    pub fn contains(&self, key: &K) -> bool {
        self.directory.contains_key(key)
    }

    /// Returns the value without touching the score.
    pub fn peek(&self, key: &K) -> Option<&V> {
        let entry = self.directory.get(key)?;
        self.list(entry.tier)
            .peek(entry.handle)
            .map(|record| &record.value)
    }

    pub fn tier_of(&self, key: &K) -> Option<Tier> {
        self.directory.get(key).map(|entry| entry.tier)
    }

    /// Current usage score of `key`.
    pub fn score(&self, key: &K) -> Option<u64> {
        let entry = self.directory.get(key)?;
        self.list(entry.tier).score(entry.handle)
    }

    /// Keys in one tier from tail to head.
    pub fn keys_in(&self, tier: Tier) -> impl Iterator<Item = &K> {
        self.list(tier).iter().map(|record| &record.key)
    }

    pub fn len(&self) -> usize {
        self.directory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directory.is_empty()
    }

    pub fn mru_len(&self) -> usize {
        self.mru.len()
    }

    pub fn mfu_len(&self) -> usize {
        self.mfu.len()
    }

    pub fn mru_capacity(&self) -> usize {
        self.mru_cap
    }

    pub fn mfu_capacity(&self) -> usize {
        self.mfu_cap
    }

    /// `true` when `set` runs the promotion/eviction pass itself.
    pub fn evicts_inline(&self) -> bool {
        self.inline_evict
    }

    pub fn clear(&mut self) {
        self.directory.clear();
        self.mru.clear();
        self.mfu.clear();
    }

    pub fn stats(&self) -> BicacheStats {
        BicacheStats::new(self.mfu.len(), self.mfu_cap, self.mru.len(), self.mru_cap)
            .with_counters(
                self.counters.hits,
                self.counters.misses,
                self.counters.promotions,
                self.counters.swaps,
                self.counters.evictions,
            )
    }

    /// Verifies both lists and that every directory entry points at a node
    /// carrying the same key in the tier it names.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.mru.check_invariants()?;
        self.mfu.check_invariants()?;

        if self.directory.len() != self.mru.len() + self.mfu.len() {
            return Err(InvariantError::new(format!(
                "directory holds {} keys, tiers hold {} + {}",
                self.directory.len(),
                self.mru.len(),
                self.mfu.len()
            )));
        }
        for (key, entry) in &self.directory {
            match self.list(entry.tier).peek(entry.handle) {
                Some(record) if record.key == *key => {},
                Some(_) => {
                    return Err(InvariantError::new(format!(
                        "{} handle points at another key",
                        entry.tier
                    )));
                },
                None => {
                    return Err(InvariantError::new(format!(
                        "{} handle does not resolve",
                        entry.tier
                    )));
                },
            }
        }
        Ok(())
    }

    fn list(&self, tier: Tier) -> &ScoredList<Record<K, V>> {
        match tier {
            Tier::Mru => &self.mru,
            Tier::Mfu => &self.mfu,
        }
    }

    fn list_mut(&mut self, tier: Tier) -> &mut ScoredList<Record<K, V>> {
        match tier {
            Tier::Mru => &mut self.mru,
            Tier::Mfu => &mut self.mfu,
        }
    }

    #[track_caller]
    fn score_in(&self, tier: Tier, handle: ScoredHandle) -> u64 {
        self.list(tier)
            .score(handle)
            .unwrap_or_else(|| directory_violation(tier, "score query returned a dead handle"))
    }

    /// Moves an MRU node to the MFU tail with its score and fixes the entry.
    fn promote(&mut self, handle: ScoredHandle) {
        let node = self.mru.remove(handle);
        let key = node.value().key.clone();
        let score = node.score();
        let promoted = self.mfu.push_tail_node(node);
        match self.directory.get_mut(&key) {
            Some(entry) => {
                entry.handle = promoted;
                entry.tier = Tier::Mfu;
            },
            None => directory_violation(Tier::Mru, "promoted node has no entry"),
        }
        trace!(score, "promoted key to mfu");
    }

    fn evict(&mut self, tier: Tier, handle: ScoredHandle) {
        let node = self.list_mut(tier).remove(handle);
        let score = node.score();
        let record = node.into_value();
        if self.directory.remove(&record.key).is_none() {
            directory_violation(tier, "evicted node has no entry");
        }
        self.counters.evictions += 1;
        trace!(%tier, score, "evicted key");
    }
}

impl<K, V> fmt::Debug for BicacheCore<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BicacheCore")
            .field("len", &self.directory.len())
            .field("mru_len", &self.mru.len())
            .field("mru_capacity", &self.mru_cap)
            .field("mfu_len", &self.mfu.len())
            .field("mfu_capacity", &self.mfu_cap)
            .field("inline_evict", &self.inline_evict)
            .finish()
    }
}

impl<K, V> CoreCache<K, V> for BicacheCore<K, V>
where
    K: Clone + Eq + Hash,
{
    fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.set(key, value)
    }

    fn get(&mut self, key: &K) -> Option<&V> {
        BicacheCore::get(self, key)
    }

    fn contains(&self, key: &K) -> bool {
        self.directory.contains_key(key)
    }

    fn len(&self) -> usize {
        self.directory.len()
    }

    /// Combined key capacity of both tiers.
    fn capacity(&self) -> usize {
        self.mru_cap.saturating_add(self.mfu_cap)
    }

    fn clear(&mut self) {
        BicacheCore::clear(self);
    }
}

impl<K, V> MutableCache<K, V> for BicacheCore<K, V>
where
    K: Clone + Eq + Hash,
{
    fn remove(&mut self, key: &K) -> Option<V> {
        BicacheCore::remove(self, key)
    }
}

impl<K, V> ScoredCache<K, V> for BicacheCore<K, V>
where
    K: Clone + Eq + Hash,
{
    fn score(&self, key: &K) -> Option<u64> {
        BicacheCore::score(self, key)
    }

    fn peek(&self, key: &K) -> Option<&V> {
        BicacheCore::peek(self, key)
    }
}

/// Thread-safe two-tier cache.
///
/// Every call takes one exclusive lock over the key directory and both tiers.
/// With a non-zero auto-evict interval a background thread runs
/// [`promote_evict`](Self::promote_evict) on that interval; it is stopped by
/// [`shutdown`](Self::shutdown) or on drop.
///
/// # Example
///
/// ```
/// use bicache::builder::BicacheBuilder;
///
/// let cache = BicacheBuilder::new()
///     .mfu_capacity(10)
///     .mru_capacity(30)
///     .build::<String, u64>();
///
/// cache.set("k".to_string(), 7);
/// assert_eq!(cache.get(&"k".to_string()), Some(7));
/// assert_eq!(cache.get(&"missing".to_string()), None);
/// ```
pub struct Bicache<K, V> {
    core: Arc<Mutex<BicacheCore<K, V>>>,
    evictor: Mutex<Option<AutoEvictor>>,
}

impl<K, V> Bicache<K, V>
where
    K: Clone + Eq + Hash + Send + 'static,
    V: Send + 'static,
{
    /// Validates `config`, builds the core and starts the evictor if an
    /// interval is configured.
    pub fn with_config(config: &BicacheConfig) -> Result<Self, ConfigError> {
        let core = Arc::new(Mutex::new(BicacheCore::with_config(config)?));
        let evictor = match config.auto_evict_interval() {
            Some(interval) => Some(Self::spawn_evictor(Arc::downgrade(&core), interval)?),
            None => None,
        };
        Ok(Self {
            core,
            evictor: Mutex::new(evictor),
        })
    }

    fn spawn_evictor(
        core: Weak<Mutex<BicacheCore<K, V>>>,
        interval: Duration,
    ) -> Result<AutoEvictor, ConfigError> {
        AutoEvictor::start(interval, move || {
            if let Some(core) = core.upgrade() {
                core.lock().promote_evict();
            }
        })
        .map_err(|err| ConfigError::new(format!("failed to start auto-evict thread: {err}")))
    }

    /// Returns a clone of the value and bumps its score.
    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.core.lock().get(key).cloned()
    }

    /// Runs `f` on the value under the lock, bumping its score.
    pub fn get_with<R>(&self, key: &K, f: impl FnOnce(&V) -> R) -> Option<R> {
        self.core.lock().get(key).map(f)
    }

    pub fn set(&self, key: K, value: V) -> Option<V> {
        self.core.lock().set(key, value)
    }

    pub fn promote_evict(&self) -> PromoteEvictReport {
        self.core.lock().promote_evict()
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.core.lock().remove(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.core.lock().contains(key)
    }

    pub fn tier_of(&self, key: &K) -> Option<Tier> {
        self.core.lock().tier_of(key)
    }

    pub fn len(&self) -> usize {
        self.core.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.core.lock().is_empty()
    }

    pub fn clear(&self) {
        self.core.lock().clear();
    }

    pub fn stats(&self) -> BicacheStats {
        self.core.lock().stats()
    }

    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.core.lock().check_invariants()
    }

    /// Runs `f` with exclusive access to the core.
    pub fn with_core<R>(&self, f: impl FnOnce(&mut BicacheCore<K, V>) -> R) -> R {
        f(&mut self.core.lock())
    }
}

impl<K, V> Bicache<K, V> {
    /// `true` while a background evictor is running.
    pub fn is_auto_evicting(&self) -> bool {
        self.evictor.lock().is_some()
    }

    /// Stops the background evictor, if any, and waits for it to exit.
    /// Later calls are no-ops.
    pub fn shutdown(&self) {
        // The evictor lock must not be held across the join.
        let evictor = self.evictor.lock().take();
        if let Some(mut evictor) = evictor {
            evictor.stop();
        }
    }
}

impl<K, V> Drop for Bicache<K, V> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<K, V> fmt::Debug for Bicache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let auto_evicting = self.is_auto_evicting();
        f.debug_struct("Bicache")
            .field("core", &*self.core.lock())
            .field("auto_evicting", &auto_evicting)
            .finish()
    }
}

impl<K: Send, V: Send> ConcurrentCache for Bicache<K, V> {}
