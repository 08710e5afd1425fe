//! Results reported by mutating store operations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::names::ThreadId;
use crate::node::NodeId;

/// Cursor state of one thread, as needed to drive undo/redo controls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadState {
    /// Number of nodes in the thread.
    pub length: usize,
    /// Index of the current node.
    pub current: usize,
    /// Whether `undo` would move the cursor.
    pub has_prev: bool,
    /// Whether `redo` would move the cursor.
    pub has_next: bool,
}

/// Outcome of a mutating operation.
///
/// `success == false` marks an expected no-op (nothing changed, nothing to
/// undo, unknown thread); the store is left untouched in that case.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpResult {
    pub success: bool,
    /// The node the operation produced or moved to.
    pub node: Option<NodeId>,
    /// State of every thread the operation touched.
    pub threads: BTreeMap<ThreadId, ThreadState>,
}

impl OpResult {
    /// A successful operation that left its thread(s) at `node`.
    pub fn done(node: NodeId) -> Self {
        Self {
            success: true,
            node: Some(node),
            threads: BTreeMap::new(),
        }
    }

    /// An operation that changed nothing.
    pub fn noop() -> Self {
        Self::default()
    }

    /// Attach the state of thread `id` after the operation.
    pub fn with_thread(mut self, id: ThreadId, state: ThreadState) -> Self {
        self.threads.insert(id, state);
        self
    }

    /// The reported state of `id`, if the operation touched it.
    pub fn thread(&self, id: &ThreadId) -> Option<&ThreadState> {
        self.threads.get(id)
    }
}
