//! bicache: a two-tier MRU/MFU cache built on scored, arena-backed lists.
//!
//! New keys land in the recently-used tier. Every read bumps a per-key
//! score, and a promotion/eviction pass moves the top MRU scorers into the
//! frequently-used tier whenever the MRU overflows. The pass runs either
//! inline on every write or on a background thread.
//!
//! ```
//! use bicache::prelude::*;
//!
//! let cache = BicacheBuilder::new()
//!     .mfu_capacity(2)
//!     .mru_capacity(3)
//!     .build::<&str, u32>();
//!
//! for (i, key) in ["k0", "k1", "k2"].into_iter().enumerate() {
//!     cache.set(key, i as u32);
//! }
//! cache.get(&"k2");
//! cache.set("k3", 3);
//!
//! assert_eq!(cache.tier_of(&"k2"), Some(Tier::Mfu));
//! assert_eq!(cache.stats().mru_size, 3);
//! ```

pub mod builder;
pub mod config;
pub mod ds;
pub mod error;
pub mod evictor;
pub mod policy;
pub mod prelude;
pub mod stats;
pub mod traits;
