//! History nodes: one immutable snapshot plus the threads that hold it.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use refcache_graph::Snapshot;
use serde::{Deserialize, Serialize};

use crate::names::ThreadId;

/// Identifier of a history node.
///
/// Ids are assigned in strictly increasing order, so every thread's node list
/// is sorted by id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl NodeId {
    /// The raw sequence number.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A snapshot stored in the repository.
///
/// `owners` is the set of threads whose node list contains this node. A node
/// left with no owner is deleted from the repository.
#[derive(Clone, Debug)]
pub struct CacheNode {
    pub id: NodeId,
    pub snapshot: Arc<Snapshot>,
    owners: BTreeSet<ThreadId>,
}

impl CacheNode {
    /// A node with no owners yet.
    pub fn new(id: NodeId, snapshot: Arc<Snapshot>) -> Self {
        Self {
            id,
            snapshot,
            owners: BTreeSet::new(),
        }
    }

    /// Returns `true` if `thread` was not already an owner.
    pub fn add_owner(&mut self, thread: &ThreadId) -> bool {
        self.owners.insert(thread.clone())
    }

    /// Returns `true` if `thread` was an owner.
    pub fn remove_owner(&mut self, thread: &ThreadId) -> bool {
        self.owners.remove(thread)
    }

    /// Whether any thread still holds this node.
    pub fn is_owned(&self) -> bool {
        !self.owners.is_empty()
    }

    /// Whether `thread` holds this node.
    pub fn is_owned_by(&self, thread: &ThreadId) -> bool {
        self.owners.contains(thread)
    }

    /// Threads holding this node.
    pub fn owners(&self) -> impl Iterator<Item = &ThreadId> {
        self.owners.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ownership_is_a_set() {
        let mut node = CacheNode::new(NodeId(1), Arc::new(Snapshot::new()));
        let side = ThreadId::new("side").unwrap();
        assert!(!node.is_owned());
        assert!(node.add_owner(&ThreadId::main()));
        assert!(!node.add_owner(&ThreadId::main()));
        assert!(node.add_owner(&side));
        assert_eq!(node.owners().count(), 2);

        assert!(node.remove_owner(&side));
        assert!(!node.remove_owner(&side));
        assert!(node.is_owned_by(&ThreadId::main()));
        assert!(node.remove_owner(&ThreadId::main()));
        assert!(!node.is_owned());
    }

    #[test]
    fn node_ids_order_numerically() {
        assert!(NodeId(2) < NodeId(10));
        assert_eq!(NodeId(7).to_string(), "#7");
        assert_eq!(serde_json::to_string(&NodeId(7)).unwrap(), "7");
    }
}
