pub use crate::builder::BicacheBuilder;
pub use crate::config::BicacheConfig;
pub use crate::ds::{ScoredHandle, ScoredList, ScoredNode, SlotArena, SlotId};
pub use crate::error::{ConfigError, InvariantError};
pub use crate::evictor::AutoEvictor;
pub use crate::policy::bicache::{Bicache, BicacheCore, PromoteEvictReport, Tier};
pub use crate::stats::BicacheStats;
pub use crate::traits::{ConcurrentCache, CoreCache, MutableCache, ScoredCache};
