//! A named, independently steppable sequence of history nodes.

use tracing::trace;

use crate::names::ThreadId;
use crate::node::NodeId;
use crate::stats::ThreadState;

/// One history thread.
///
/// `nodes` is sorted by id and never empty; `current` always indexes into it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheThread {
    id: ThreadId,
    nodes: Vec<NodeId>,
    current: usize,
}

impl CacheThread {
    /// A thread holding the single node `first`.
    pub fn new(id: ThreadId, first: NodeId) -> Self {
        Self {
            id,
            nodes: vec![first],
            current: 0,
        }
    }

    /// The thread's id.
    pub fn id(&self) -> &ThreadId {
        &self.id
    }

    /// Held node ids, oldest first.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Number of held nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Index of the current node.
    pub fn current(&self) -> usize {
        self.current
    }

    /// The node at the cursor.
    pub fn current_node(&self) -> NodeId {
        self.nodes[self.current]
    }

    /// The oldest held node.
    pub fn first_node(&self) -> NodeId {
        self.nodes[0]
    }

    /// Whether [`undo`](Self::undo) would move the cursor.
    pub fn has_prev(&self) -> bool {
        self.current > 0
    }

    /// Whether [`redo`](Self::redo) would move the cursor.
    pub fn has_next(&self) -> bool {
        self.current + 1 < self.nodes.len()
    }

    /// Step the cursor back. Returns `false` at the first node.
    pub fn undo(&mut self) -> bool {
        if !self.has_prev() {
            return false;
        }
        self.current -= 1;
        trace!(thread = %self.id, current = self.current, "undo");
        true
    }

    /// Step the cursor forward. Returns `false` at the last node.
    pub fn redo(&mut self) -> bool {
        if !self.has_next() {
            return false;
        }
        self.current += 1;
        trace!(thread = %self.id, current = self.current, "redo");
        true
    }

    /// Position of `node` in this thread, by binary search.
    pub fn position_of(&self, node: NodeId) -> Option<usize> {
        self.nodes.binary_search(&node).ok()
    }

    /// Whether the thread holds `node`.
    pub fn contains(&self, node: NodeId) -> bool {
        self.position_of(node).is_some()
    }

    /// Nodes from the first up to and including the current one.
    pub fn history(&self) -> &[NodeId] {
        &self.nodes[..=self.current]
    }

    /// Discard every node after the cursor, returning them.
    pub fn truncate_after_current(&mut self) -> Vec<NodeId> {
        self.nodes.split_off(self.current + 1)
    }

    /// Append `node` and move the cursor onto it.
    ///
    /// `node` must be newer than every node already held.
    pub fn push(&mut self, node: NodeId) {
        debug_assert!(self.nodes.last().map_or(true, |last| *last < node));
        self.nodes.push(node);
        self.current = self.nodes.len() - 1;
    }

    /// Insert `node` keeping the list sorted. The cursor keeps pointing at the
    /// same node. Returns `false` if the node was already present.
    pub fn insert_sorted(&mut self, node: NodeId) -> bool {
        match self.nodes.binary_search(&node) {
            Ok(_) => false,
            Err(pos) => {
                self.nodes.insert(pos, node);
                if pos <= self.current {
                    self.current += 1;
                }
                true
            }
        }
    }

    /// Move the cursor onto `node`. Returns `false` if it is not held.
    pub fn seek(&mut self, node: NodeId) -> bool {
        match self.position_of(node) {
            Some(pos) => {
                self.current = pos;
                true
            }
            None => false,
        }
    }

    /// Drop the oldest nodes until at most `keep` remain, never dropping the
    /// current node. Returns the dropped nodes.
    pub fn drop_oldest(&mut self, keep: usize) -> Vec<NodeId> {
        let excess = self.nodes.len().saturating_sub(keep.max(1));
        let count = excess.min(self.current);
        self.current -= count;
        self.nodes.drain(..count).collect()
    }

    /// Cursor summary for operation results.
    pub fn state(&self) -> ThreadState {
        ThreadState {
            length: self.nodes.len(),
            current: self.current,
            has_prev: self.has_prev(),
            has_next: self.has_next(),
        }
    }
}
