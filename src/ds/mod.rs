pub mod scored_list;
pub mod slot_arena;

pub use scored_list::{ScoredHandle, ScoredList, ScoredListHandleIter, ScoredListIter, ScoredNode};
pub use slot_arena::{SlotArena, SlotId};
