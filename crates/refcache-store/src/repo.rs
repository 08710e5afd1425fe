//! Node storage shared by every thread of an instance.

use std::collections::BTreeMap;
use std::sync::Arc;

use refcache_graph::Snapshot;
use tracing::debug;

use crate::names::ThreadId;
use crate::node::{CacheNode, NodeId};

/// All live history nodes, keyed by id.
///
/// Nodes are reference counted by owner thread: [`CacheRepo::release`]
/// deletes a node once no thread holds it.
#[derive(Debug, Default)]
pub struct CacheRepo {
    nodes: BTreeMap<NodeId, CacheNode>,
    next_id: u64,
}

impl CacheRepo {
    /// Create an empty node repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a live node.
    pub fn get(&self, id: NodeId) -> Option<&CacheNode> {
        self.nodes.get(&id)
    }

    /// Whether `id` is still live.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Live node ids in creation order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Store `snapshot` under a fresh id, owned by `owners`.
    pub fn insert<'t>(&mut self, snapshot: Arc<Snapshot>, owners: impl IntoIterator<Item = &'t ThreadId>) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        let mut node = CacheNode::new(id, snapshot);
        for owner in owners {
            node.add_owner(owner);
        }
        self.nodes.insert(id, node);
        id
    }

    /// Record that `thread` holds `id`. Returns `false` for unknown nodes.
    pub fn claim(&mut self, id: NodeId, thread: &ThreadId) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.add_owner(thread);
                true
            }
            None => false,
        }
    }

    /// Record that `thread` no longer holds `id`, deleting the node if no
    /// owner remains. Returns `true` if the node was deleted.
    pub fn release(&mut self, id: NodeId, thread: &ThreadId) -> bool {
        let Some(node) = self.nodes.get_mut(&id) else {
            return false;
        };
        node.remove_owner(thread);
        if node.is_owned() {
            return false;
        }
        self.nodes.remove(&id);
        debug!(node = %id, %thread, "reclaimed unowned node");
        true
    }

    /// Release every node in `ids` from `thread`. Returns how many were
    /// deleted.
    pub fn release_all(&mut self, ids: &[NodeId], thread: &ThreadId) -> usize {
        ids.iter().filter(|id| self.release(**id, thread)).count()
    }

    /// Drop every node and restart id assignment.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.next_id = 0;
    }
}
