//! Scored doubly linked list backed by `SlotArena`.
//!
//! A recency-ordered list whose nodes also carry a usage score. Besides the
//! intrusive recency links, every node is indexed in an ordered score map so
//! the lowest and highest scorers can be pulled without a scan.
//!
//! ## Architecture
//!
//! ```text
//!   arena (SlotArena<Node<T>>)
//!   ┌────────┬──────────────────────────────────────────────────────┐
//!   │ SlotId │ Node { value, score, seq, prev, next, state }        │
//!   ├────────┼──────────────────────────────────────────────────────┤
//!   │ id_1   │ { A, score: 0, seq: 0, prev: None,    next: id_2 }   │
//!   │ id_2   │ { B, score: 4, seq: 1, prev: id_1,    next: id_3 }   │
//!   │ id_3   │ { C, score: 1, seq: 2, prev: id_2,    next: None }   │
//!   └────────┴──────────────────────────────────────────────────────┘
//!
//!   tail ─► [id_1] ──next──► [id_2] ──next──► [id_3] ◄── head
//!
//!   scores (BTreeMap<(score, seq), SlotId>), ascending:
//!     (0, 0) → id_1   (1, 2) → id_3   (4, 1) → id_2
//! ```
//!
//! `next` walks from the tail toward the head; `prev` walks back. Pushing to
//! the tail repeatedly therefore yields reverse push order when walking `next`
//! from the tail.
//!
//! ## Score ties
//!
//! The index key is `(score, seq)` where `seq` is a per-list counter taken when
//! a node is attached. `read` keeps the node's `seq`, so among equal scores the
//! node attached earlier ranks lower.
//!
//! ## Deferred removal
//!
//! `remove_async` unlinks a node from the recency list immediately but leaves
//! it in the score index and in `len()`. `sync` drops every pending node from
//! the index and the arena in one pass. Until then `high_scores`/`low_scores`
//! can still return pending handles.
//!
//! ## Handles
//!
//! A [`ScoredHandle`] names the owning list and a generation-checked slot.
//! Passing a handle to a list that does not own it, or one whose node has been
//! removed or is pending removal, is a contract violation and panics.
//!
//! ## Performance
//! - `push_*` / `push_*_node`: O(log n)
//! - `move_to_head` / `move_to_tail` / `next` / `prev`: O(1)
//! - `read` / `remove`: O(log n)
//! - `remove_async`: O(1), `sync`: O(p log n) for p pending nodes
//! - `high_scores(k)` / `low_scores(k)`: O(k)

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::ds::slot_arena::{SlotArena, SlotId};
use crate::error::InvariantError;

static NEXT_LIST_ID: AtomicU64 = AtomicU64::new(1);

/// Stable reference to a node inside a specific [`ScoredList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScoredHandle {
    list: u64,
    slot: SlotId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeState {
    Linked,
    PendingRemoval,
}

#[derive(Debug)]
struct Node<T> {
    value: T,
    score: u64,
    seq: u64,
    prev: Option<SlotId>,
    next: Option<SlotId>,
    state: NodeState,
}

/// A node that is not linked into any list.
///
/// Produced by [`ScoredList::remove`] and friends; hand it to
/// [`ScoredList::push_head_node`] or [`ScoredList::push_tail_node`] to relink
/// it (possibly into another list) with its score intact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredNode<T> {
    value: T,
    score: u64,
}

impl<T> ScoredNode<T> {
    /// Creates a detached node with score 0.
    pub fn new(value: T) -> Self {
        Self { value, score: 0 }
    }

    pub fn with_score(value: T, score: u64) -> Self {
        Self { value, score }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut T {
        &mut self.value
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

#[cold]
#[track_caller]
fn contract_violation(what: &str, handle: ScoredHandle, list: u64) -> ! {
    panic!(
        "scored list contract violation: {what} (handle {:?} used on list {list})",
        handle
    )
}

/// Recency-ordered list with a score-ranked index and deferred removal.
#[derive(Debug)]
pub struct ScoredList<T> {
    id: u64,
    arena: SlotArena<Node<T>>,
    head: Option<SlotId>,
    tail: Option<SlotId>,
    scores: BTreeMap<(u64, u64), SlotId>,
    pending: Vec<SlotId>,
    next_seq: u64,
}

impl<T> ScoredList<T> {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty list with reserved node capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            id: NEXT_LIST_ID.fetch_add(1, Ordering::Relaxed),
            arena: SlotArena::with_capacity(capacity),
            head: None,
            tail: None,
            scores: BTreeMap::new(),
            pending: Vec::new(),
            next_seq: 0,
        }
    }

    /// Number of nodes, including nodes pending asynchronous removal.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Number of nodes unlinked by `remove_async` and not yet synced.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn head(&self) -> Option<ScoredHandle> {
        self.head.map(|slot| self.handle(slot))
    }

    pub fn tail(&self) -> Option<ScoredHandle> {
        self.tail.map(|slot| self.handle(slot))
    }

    /// Returns `true` if `handle` names a linked node of this list.
    pub fn contains(&self, handle: ScoredHandle) -> bool {
        self.linked(handle).is_some()
    }

    /// Returns the value without touching the score.
    pub fn peek(&self, handle: ScoredHandle) -> Option<&T> {
        self.linked(handle).map(|node| &node.value)
    }

    /// Mutable access to the value without touching the score.
    pub fn peek_mut(&mut self, handle: ScoredHandle) -> Option<&mut T> {
        if handle.list != self.id {
            return None;
        }
        self.arena
            .get_mut(handle.slot)
            .filter(|node| node.state == NodeState::Linked)
            .map(|node| &mut node.value)
    }

    pub fn score(&self, handle: ScoredHandle) -> Option<u64> {
        self.linked(handle).map(|node| node.score)
    }

    /// Returns the value and bumps the node's score by one.
    ///
    /// # Panics
    ///
    /// Panics if `handle` is not a linked node of this list.
    #[track_caller]
    pub fn read(&mut self, handle: ScoredHandle) -> &T {
        let slot = self.linked_slot(handle);
        let list = self.id;
        let node = self
            .arena
            .get_mut(slot)
            .unwrap_or_else(|| contract_violation("node vanished", handle, list));
        self.scores.remove(&(node.score, node.seq));
        node.score += 1;
        self.scores.insert((node.score, node.seq), slot);
        &node.value
    }

    /// Neighbour toward the head, or `None` at the head.
    ///
    /// # Panics
    ///
    /// Panics if `handle` is not a linked node of this list.
    #[track_caller]
    pub fn next(&self, handle: ScoredHandle) -> Option<ScoredHandle> {
        let slot = self.linked_slot(handle);
        self.arena
            .get(slot)
            .and_then(|node| node.next)
            .map(|next| self.handle(next))
    }

    /// Neighbour toward the tail, or `None` at the tail.
    ///
    /// # Panics
    ///
    /// Panics if `handle` is not a linked node of this list.
    #[track_caller]
    pub fn prev(&self, handle: ScoredHandle) -> Option<ScoredHandle> {
        let slot = self.linked_slot(handle);
        self.arena
            .get(slot)
            .and_then(|node| node.prev)
            .map(|prev| self.handle(prev))
    }

    /// Inserts a new node with score 0 at the head.
    pub fn push_head(&mut self, value: T) -> ScoredHandle {
        self.push_head_node(ScoredNode::new(value))
    }

    /// Inserts a new node with score 0 at the tail.
    pub fn push_tail(&mut self, value: T) -> ScoredHandle {
        self.push_tail_node(ScoredNode::new(value))
    }

    /// Links a detached node at the head, keeping its value and score.
    pub fn push_head_node(&mut self, node: ScoredNode<T>) -> ScoredHandle {
        let slot = self.insert_node(node);
        self.attach_head(slot);
        self.handle(slot)
    }

    /// Links a detached node at the tail, keeping its value and score.
    pub fn push_tail_node(&mut self, node: ScoredNode<T>) -> ScoredHandle {
        let slot = self.insert_node(node);
        self.attach_tail(slot);
        self.handle(slot)
    }

    /// # Panics
    ///
    /// Panics if `handle` is not a linked node of this list.
    #[track_caller]
    pub fn move_to_head(&mut self, handle: ScoredHandle) {
        let slot = self.linked_slot(handle);
        if self.head == Some(slot) {
            return;
        }
        self.unlink(slot);
        self.attach_head(slot);
    }

    /// # Panics
    ///
    /// Panics if `handle` is not a linked node of this list.
    #[track_caller]
    pub fn move_to_tail(&mut self, handle: ScoredHandle) {
        let slot = self.linked_slot(handle);
        if self.tail == Some(slot) {
            return;
        }
        self.unlink(slot);
        self.attach_tail(slot);
    }

    /// Unlinks the node, drops it from the score index and returns it detached.
    ///
    /// # Panics
    ///
    /// Panics if `handle` is not a linked node of this list.
    #[track_caller]
    pub fn remove(&mut self, handle: ScoredHandle) -> ScoredNode<T> {
        let slot = self.linked_slot(handle);
        self.unlink(slot);
        let list = self.id;
        let node = self
            .arena
            .remove(slot)
            .unwrap_or_else(|| contract_violation("node vanished", handle, list));
        self.scores.remove(&(node.score, node.seq));
        ScoredNode {
            value: node.value,
            score: node.score,
        }
    }

    /// Unlinks the node now; index and length cleanup wait for [`sync`](Self::sync).
    ///
    /// # Panics
    ///
    /// Panics if `handle` is not a linked node of this list.
    #[track_caller]
    pub fn remove_async(&mut self, handle: ScoredHandle) {
        let slot = self.linked_slot(handle);
        self.unlink(slot);
        if let Some(node) = self.arena.get_mut(slot) {
            node.state = NodeState::PendingRemoval;
        }
        self.pending.push(slot);
    }

    /// Finishes every pending asynchronous removal. Returns how many nodes
    /// were dropped.
    pub fn sync(&mut self) -> usize {
        let mut dropped = 0;
        for slot in self.pending.drain(..) {
            if let Some(node) = self.arena.remove(slot) {
                self.scores.remove(&(node.score, node.seq));
                dropped += 1;
            }
        }
        dropped
    }

    pub fn remove_head(&mut self) -> Option<ScoredNode<T>> {
        let handle = self.head()?;
        Some(self.remove(handle))
    }

    pub fn remove_tail(&mut self) -> Option<ScoredNode<T>> {
        let handle = self.tail()?;
        Some(self.remove(handle))
    }

    /// Returns `false` if the list had no linked head.
    pub fn remove_head_async(&mut self) -> bool {
        match self.head() {
            Some(handle) => {
                self.remove_async(handle);
                true
            },
            None => false,
        }
    }

    /// Returns `false` if the list had no linked tail.
    pub fn remove_tail_async(&mut self) -> bool {
        match self.tail() {
            Some(handle) => {
                self.remove_async(handle);
                true
            },
            None => false,
        }
    }

    /// The `n` highest scorers, ascending: the last element is the maximum.
    pub fn high_scores(&self, n: usize) -> Vec<ScoredHandle> {
        let n = n.min(self.len());
        let mut top: Vec<_> = self
            .scores
            .values()
            .rev()
            .take(n)
            .map(|&slot| self.handle(slot))
            .collect();
        top.reverse();
        top
    }

    /// The `n` lowest scorers, ascending.
    pub fn low_scores(&self, n: usize) -> Vec<ScoredHandle> {
        let n = n.min(self.len());
        self.scores
            .values()
            .take(n)
            .map(|&slot| self.handle(slot))
            .collect()
    }

    /// Values from tail to head.
    pub fn iter(&self) -> ScoredListIter<'_, T> {
        ScoredListIter {
            list: self,
            current: self.tail,
        }
    }

    /// Handles from tail to head.
    pub fn iter_handles(&self) -> ScoredListHandleIter<'_, T> {
        ScoredListHandleIter {
            list: self,
            current: self.tail,
        }
    }

    /// Drops every node, pending ones included.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.scores.clear();
        self.pending.clear();
        self.head = None;
        self.tail = None;
    }

    /// Returns an approximate memory footprint in bytes.
    pub fn approx_bytes(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.arena.approx_bytes()
            + self.scores.len() * std::mem::size_of::<((u64, u64), SlotId)>()
            + self.pending.capacity() * std::mem::size_of::<SlotId>()
    }

    /// Walks both views and reports the first inconsistency found.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        if self.head.is_none() != self.tail.is_none() {
            return Err(InvariantError::new("head and tail disagree on emptiness"));
        }

        let mut linked = 0usize;
        let mut prev = None;
        let mut current = self.tail;
        while let Some(slot) = current {
            let node = self
                .arena
                .get(slot)
                .ok_or_else(|| InvariantError::new("traversal reached a free slot"))?;
            if node.state != NodeState::Linked {
                return Err(InvariantError::new("pending node reachable by traversal"));
            }
            if node.prev != prev {
                return Err(InvariantError::new("prev link does not mirror next link"));
            }
            if self.scores.get(&(node.score, node.seq)) != Some(&slot) {
                return Err(InvariantError::new("linked node missing from score index"));
            }
            if node.next.is_none() && self.head != Some(slot) {
                return Err(InvariantError::new("traversal ended before head"));
            }
            linked += 1;
            if linked > self.arena.len() {
                return Err(InvariantError::new("cycle in recency links"));
            }
            prev = Some(slot);
            current = node.next;
        }

        for &slot in &self.pending {
            let node = self
                .arena
                .get(slot)
                .ok_or_else(|| InvariantError::new("pending slot already freed"))?;
            if node.state != NodeState::PendingRemoval {
                return Err(InvariantError::new("pending set holds a linked node"));
            }
            if self.scores.get(&(node.score, node.seq)) != Some(&slot) {
                return Err(InvariantError::new("pending node missing from score index"));
            }
        }

        if linked + self.pending.len() != self.arena.len() {
            return Err(InvariantError::new(format!(
                "length mismatch: linked {} + pending {} != len {}",
                linked,
                self.pending.len(),
                self.arena.len()
            )));
        }
        if self.scores.len() != self.arena.len() {
            return Err(InvariantError::new(format!(
                "score index holds {} entries for {} nodes",
                self.scores.len(),
                self.arena.len()
            )));
        }
        Ok(())
    }

    fn handle(&self, slot: SlotId) -> ScoredHandle {
        ScoredHandle {
            list: self.id,
            slot,
        }
    }

    fn linked(&self, handle: ScoredHandle) -> Option<&Node<T>> {
        if handle.list != self.id {
            return None;
        }
        self.arena
            .get(handle.slot)
            .filter(|node| node.state == NodeState::Linked)
    }

    #[track_caller]
    fn linked_slot(&self, handle: ScoredHandle) -> SlotId {
        if handle.list != self.id {
            contract_violation("handle belongs to another list", handle, self.id);
        }
        match self.arena.get(handle.slot) {
            Some(node) if node.state == NodeState::Linked => handle.slot,
            Some(_) => contract_violation("node is pending removal", handle, self.id),
            None => contract_violation("node was already removed", handle, self.id),
        }
    }

    fn insert_node(&mut self, node: ScoredNode<T>) -> SlotId {
        let seq = self.next_seq;
        self.next_seq += 1;
        let slot = self.arena.insert(Node {
            value: node.value,
            score: node.score,
            seq,
            prev: None,
            next: None,
            state: NodeState::Linked,
        });
        self.scores.insert((node.score, seq), slot);
        slot
    }

    fn unlink(&mut self, slot: SlotId) {
        let Some((prev, next)) = self.arena.get(slot).map(|node| (node.prev, node.next)) else {
            return;
        };

        match prev {
            Some(prev_slot) => {
                if let Some(prev_node) = self.arena.get_mut(prev_slot) {
                    prev_node.next = next;
                }
            },
            None => self.tail = next,
        }
        match next {
            Some(next_slot) => {
                if let Some(next_node) = self.arena.get_mut(next_slot) {
                    next_node.prev = prev;
                }
            },
            None => self.head = prev,
        }

        if let Some(node) = self.arena.get_mut(slot) {
            node.prev = None;
            node.next = None;
        }
    }

    fn attach_head(&mut self, slot: SlotId) {
        let old_head = self.head;
        if let Some(node) = self.arena.get_mut(slot) {
            node.next = None;
            node.prev = old_head;
        }
        match old_head {
            Some(old) => {
                if let Some(old_node) = self.arena.get_mut(old) {
                    old_node.next = Some(slot);
                }
            },
            None => self.tail = Some(slot),
        }
        self.head = Some(slot);
    }

    fn attach_tail(&mut self, slot: SlotId) {
        let old_tail = self.tail;
        if let Some(node) = self.arena.get_mut(slot) {
            node.prev = None;
            node.next = old_tail;
        }
        match old_tail {
            Some(old) => {
                if let Some(old_node) = self.arena.get_mut(old) {
                    old_node.prev = Some(slot);
                }
            },
            None => self.head = Some(slot),
        }
        self.tail = Some(slot);
    }
}

impl<T> Default for ScoredList<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over values from tail to head.
pub struct ScoredListIter<'a, T> {
    list: &'a ScoredList<T>,
    current: Option<SlotId>,
}

impl<'a, T> Iterator for ScoredListIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.current?;
        let node = self.list.arena.get(slot)?;
        self.current = node.next;
        Some(&node.value)
    }
}

/// Iterator over handles from tail to head.
pub struct ScoredListHandleIter<'a, T> {
    list: &'a ScoredList<T>,
    current: Option<SlotId>,
}

impl<T> Iterator for ScoredListHandleIter<'_, T> {
    type Item = ScoredHandle;

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.current?;
        let node = self.list.arena.get(slot)?;
        self.current = node.next;
        Some(self.list.handle(slot))
    }
}
