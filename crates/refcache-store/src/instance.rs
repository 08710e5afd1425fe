//! One cache instance: the node repository, its threads, and the write
//! protocol that ties graph commits to history.

use std::collections::BTreeMap;
use std::sync::Arc;

use refcache_graph::{self as graph, GraphResult, Snapshot};
use refcache_types::{Uid, UidField, Value};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::names::ThreadId;
use crate::node::{CacheNode, NodeId};
use crate::repo::CacheRepo;
use crate::stats::{OpResult, ThreadState};
use crate::thread::CacheThread;

/// A versioned entity cache.
///
/// Every successful write commits exactly one new node and appends it to each
/// targeted thread. `main` always exists; other threads are created on their
/// first write by forking from `main`'s current node.
#[derive(Debug)]
pub struct CacheInstance {
    field: UidField,
    repo: CacheRepo,
    threads: BTreeMap<ThreadId, CacheThread>,
    written: bool,
}

impl CacheInstance {
    /// An instance whose `main` thread holds a single empty node.
    pub fn new(field: UidField) -> Self {
        let mut instance = Self {
            field,
            repo: CacheRepo::new(),
            threads: BTreeMap::new(),
            written: false,
        };
        instance.init_main();
        instance
    }

    fn init_main(&mut self) {
        let main = ThreadId::main();
        let root = self.repo.insert(Arc::new(Snapshot::new()), [&main]);
        self.threads.insert(main.clone(), CacheThread::new(main, root));
    }

    /// The uid field entities are indexed by.
    pub fn field(&self) -> &UidField {
        &self.field
    }

    /// Change the uid field. Only allowed while nothing has been written.
    pub fn set_field(&mut self, field: UidField) -> StoreResult<()> {
        if self.has_history() {
            return Err(StoreError::IllegalOperation(format!(
                "cannot change uid field to {:?} after writes",
                field.name()
            )));
        }
        self.field = field;
        Ok(())
    }

    /// Whether any write has been committed since creation or the last reset.
    pub fn has_history(&self) -> bool {
        self.written
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Write `value` to `threads` (`main` when empty).
    pub fn put(&mut self, value: &Value, threads: &[ThreadId], strong: bool) -> StoreResult<OpResult> {
        let field = self.field.clone();
        self.write(threads, |live| graph::put(live, &field, value, strong))
    }

    /// Evict `uids` from `threads` (`main` when empty).
    pub fn evict(&mut self, uids: &[Uid], threads: &[ThreadId]) -> StoreResult<OpResult> {
        let field = self.field.clone();
        self.write(threads, |live| graph::evict(live, &field, uids))
    }

    fn write<F>(&mut self, threads: &[ThreadId], apply: F) -> StoreResult<OpResult>
    where
        F: FnOnce(&Snapshot) -> GraphResult<Option<Snapshot>>,
    {
        let targets = targets(threads);
        let base = self.base_snapshot(&targets[0]);
        let Some(next) = apply(&*base)? else {
            debug!(threads = ?targets, "write changed nothing");
            return Ok(self.report(OpResult::noop(), &targets));
        };

        for target in &targets {
            if !self.threads.contains_key(target) {
                self.fork(target);
            }
            self.clear_next(target);
        }
        let node = self.repo.insert(Arc::new(next), &targets);
        self.written = true;
        for target in &targets {
            if let Some(thread) = self.threads.get_mut(target) {
                thread.push(node);
            }
        }
        debug!(%node, threads = ?targets, entities = self.repo.get(node).map_or(0, |n| n.snapshot.len()), "committed node");
        Ok(self.report(OpResult::done(node), &targets))
    }

    /// Snapshot a write to `thread` starts from.
    fn base_snapshot(&self, thread: &ThreadId) -> Arc<Snapshot> {
        self.snapshot(thread)
            .or_else(|| self.snapshot(&ThreadId::main()))
            .cloned()
            .unwrap_or_default()
    }

    /// Open `id` at `main`'s current node.
    fn fork(&mut self, id: &ThreadId) {
        let Some(root) = self.threads.get(&ThreadId::main()).map(CacheThread::current_node) else {
            return;
        };
        self.repo.claim(root, id);
        self.threads.insert(id.clone(), CacheThread::new(id.clone(), root));
        debug!(thread = %id, from = %root, "opened thread");
    }

    /// Discard the nodes after `id`'s cursor.
    fn clear_next(&mut self, id: &ThreadId) {
        let Some(thread) = self.threads.get_mut(id) else {
            return;
        };
        let dropped = thread.truncate_after_current();
        if !dropped.is_empty() {
            let reclaimed = self.repo.release_all(&dropped, id);
            debug!(thread = %id, dropped = dropped.len(), reclaimed, "cleared redo tail");
        }
    }

    // -----------------------------------------------------------------------
    // Cursor movement
    // -----------------------------------------------------------------------

    /// Step `id` back one node.
    pub fn undo(&mut self, id: &ThreadId) -> OpResult {
        self.step(id, CacheThread::undo)
    }

    /// Step `id` forward one node.
    pub fn redo(&mut self, id: &ThreadId) -> OpResult {
        self.step(id, CacheThread::redo)
    }

    fn step(&mut self, id: &ThreadId, mv: fn(&mut CacheThread) -> bool) -> OpResult {
        let Some(thread) = self.threads.get_mut(id) else {
            return OpResult::noop();
        };
        let result = if mv(thread) {
            OpResult::done(thread.current_node())
        } else {
            OpResult::noop()
        };
        result.with_thread(id.clone(), thread.state())
    }

    // -----------------------------------------------------------------------
    // Thread operations
    // -----------------------------------------------------------------------

    /// Fold `id` onto `target`, keeping only its first and current nodes.
    pub fn close_thread(&mut self, id: &ThreadId, target: &ThreadId) -> StoreResult<OpResult> {
        self.fold(id, target, "close", |thread| {
            let mut kept = vec![thread.first_node(), thread.current_node()];
            kept.dedup();
            kept
        })
    }

    /// Fold `id` onto `target`, keeping every node up to its cursor.
    pub fn merge_thread(&mut self, id: &ThreadId, target: &ThreadId) -> StoreResult<OpResult> {
        self.fold(id, target, "merge", |thread| thread.history().to_vec())
    }

    fn fold<F>(&mut self, id: &ThreadId, target: &ThreadId, op: &str, keep: F) -> StoreResult<OpResult>
    where
        F: FnOnce(&CacheThread) -> Vec<NodeId>,
    {
        check_side_thread(id, op)?;
        if id == target {
            return Err(StoreError::IllegalOperation(format!("cannot {op} thread {id} onto itself")));
        }
        if !self.threads.contains_key(target) {
            return Ok(OpResult::noop());
        }
        let Some(thread) = self.threads.remove(id) else {
            return Ok(OpResult::noop());
        };

        let kept = keep(&thread);
        let head = thread.current_node();
        self.clear_next(target);
        if let Some(dest) = self.threads.get_mut(target) {
            for node in &kept {
                if dest.insert_sorted(*node) {
                    self.repo.claim(*node, target);
                }
            }
            dest.seek(head);
        }
        let reclaimed = self.repo.release_all(thread.nodes(), id);
        debug!(thread = %id, %target, kept = kept.len(), reclaimed, "{op}d thread");

        let mut result = OpResult::done(head);
        if let Some(dest) = self.threads.get(target) {
            result = result.with_thread(target.clone(), dest.state());
        }
        Ok(result)
    }

    /// Abandon `id`, reclaiming every node only it held.
    pub fn cut_thread(&mut self, id: &ThreadId) -> StoreResult<OpResult> {
        check_side_thread(id, "cut")?;
        let Some(thread) = self.threads.remove(id) else {
            return Ok(OpResult::noop());
        };
        let reclaimed = self.repo.release_all(thread.nodes(), id);
        debug!(thread = %id, reclaimed, "cut thread");
        let main = ThreadId::main();
        let mut result = OpResult {
            success: true,
            node: None,
            threads: BTreeMap::new(),
        };
        if let Some(thread) = self.threads.get(&main) {
            result = result.with_thread(main, thread.state());
        }
        Ok(result)
    }

    /// Drop the oldest nodes of `id` until at most `keep` remain. The current
    /// node is always kept. Returns the number of nodes dropped.
    pub fn prune(&mut self, id: &ThreadId, keep: usize) -> usize {
        let Some(thread) = self.threads.get_mut(id) else {
            return 0;
        };
        let dropped = thread.drop_oldest(keep);
        if !dropped.is_empty() {
            let reclaimed = self.repo.release_all(&dropped, id);
            debug!(thread = %id, dropped = dropped.len(), reclaimed, "pruned history");
        }
        dropped.len()
    }

    /// Drop every thread and node, leaving `main` with one empty node.
    pub fn reset(&mut self) {
        self.threads.clear();
        self.repo.clear();
        self.written = false;
        self.init_main();
        debug!("reset cache instance");
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Thread `id`, if it exists.
    pub fn thread(&self, id: &ThreadId) -> Option<&CacheThread> {
        self.threads.get(id)
    }

    /// Every open thread, `main` included.
    pub fn threads(&self) -> impl Iterator<Item = &CacheThread> {
        self.threads.values()
    }

    /// Cursor summary of thread `id`.
    pub fn thread_state(&self, id: &ThreadId) -> Option<ThreadState> {
        self.threads.get(id).map(CacheThread::state)
    }

    /// The snapshot at `id`'s cursor.
    pub fn snapshot(&self, id: &ThreadId) -> Option<&Arc<Snapshot>> {
        let node = self.threads.get(id)?.current_node();
        self.repo.get(node).map(|n| &n.snapshot)
    }

    /// The entity `uid` as seen by `id`'s current node.
    pub fn get(&self, id: &ThreadId, uid: &Uid) -> Option<&Value> {
        self.snapshot(id)?.entity(uid)
    }

    /// Any live node, by id.
    pub fn node(&self, node: NodeId) -> Option<&CacheNode> {
        self.repo.get(node)
    }

    /// A node held by thread `id`.
    pub fn node_in(&self, id: &ThreadId, node: NodeId) -> Option<&CacheNode> {
        self.threads.get(id)?.position_of(node)?;
        self.repo.get(node)
    }

    /// Number of entities at `id`'s cursor.
    pub fn size(&self, id: &ThreadId) -> usize {
        self.snapshot(id).map_or(0, |s| s.len())
    }

    /// Number of nodes in `id`.
    pub fn length(&self, id: &ThreadId) -> usize {
        self.threads.get(id).map_or(0, CacheThread::len)
    }

    /// Number of live nodes across all threads.
    pub fn node_count(&self) -> usize {
        self.repo.len()
    }

    fn report(&self, mut result: OpResult, targets: &[ThreadId]) -> OpResult {
        for target in targets {
            if let Some(thread) = self.threads.get(target) {
                result = result.with_thread(target.clone(), thread.state());
            }
        }
        result
    }
}

impl Default for CacheInstance {
    fn default() -> Self {
        Self::new(UidField::default())
    }
}

/// Deduplicated write targets, `main` when none are given.
fn targets(threads: &[ThreadId]) -> Vec<ThreadId> {
    let mut out: Vec<ThreadId> = Vec::with_capacity(threads.len().max(1));
    for id in threads {
        if !out.contains(id) {
            out.push(id.clone());
        }
    }
    if out.is_empty() {
        out.push(ThreadId::main());
    }
    out
}

fn check_side_thread(id: &ThreadId, op: &str) -> StoreResult<()> {
    if id.is_main() {
        return Err(StoreError::IllegalOperation(format!("cannot {op} the main thread")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn entity(uid: i64, fields: Vec<(&str, Value)>) -> Value {
        let mut all = vec![("uid", Value::from(uid))];
        all.extend(fields);
        Value::record(all)
    }

    fn tid(s: &str) -> ThreadId {
        ThreadId::new(s).unwrap()
    }

    fn main_thread() -> ThreadId {
        ThreadId::main()
    }

    fn text(cache: &CacheInstance, thread: &ThreadId, uid: i64) -> Option<String> {
        cache
            .get(thread, &Uid::from(uid))
            .and_then(|v| v.field("text"))
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    fn note(uid: i64, text: &str) -> Value {
        entity(uid, vec![("text", Value::from(text))])
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    #[test]
    fn new_instance_has_empty_main() {
        let cache = CacheInstance::default();
        assert_eq!(cache.length(&main_thread()), 1);
        assert_eq!(cache.size(&main_thread()), 0);
        assert!(!cache.has_history());
    }

    #[test]
    fn put_appends_one_node() {
        let mut cache = CacheInstance::default();
        let r = cache.put(&note(1, "a"), &[], true).unwrap();
        assert!(r.success);
        assert_eq!(r.node, Some(NodeId(1)));
        assert_eq!(r.thread(&main_thread()).unwrap().length, 2);
        assert!(r.thread(&main_thread()).unwrap().has_prev);
        assert_eq!(cache.size(&main_thread()), 1);
    }

    #[test]
    fn unchanged_put_is_noop() {
        let mut cache = CacheInstance::default();
        let v = note(1, "a");
        cache.put(&v, &[], true).unwrap();
        let r = cache.put(&v, &[], true).unwrap();
        assert!(!r.success);
        assert_eq!(r.node, None);
        assert_eq!(cache.length(&main_thread()), 2);
    }

    #[test]
    fn deep_orphan_eviction_adds_one_node() {
        let a = entity(1, vec![]);
        let b = entity(2, vec![("item", a)]);
        let c = entity(3, vec![("item", b)]);
        let mut cache = CacheInstance::default();
        cache.put(&c, &[], true).unwrap();
        assert_eq!(cache.size(&main_thread()), 3);
        let before = cache.length(&main_thread());

        let r = cache.evict(&[Uid::from(3)], &[]).unwrap();
        assert!(r.success);
        assert_eq!(cache.size(&main_thread()), 0);
        assert_eq!(cache.length(&main_thread()), before + 1);
    }

    #[test]
    fn evict_unknown_is_noop() {
        let mut cache = CacheInstance::default();
        let r = cache.evict(&[Uid::from(9)], &[]).unwrap();
        assert!(!r.success);
        assert_eq!(cache.length(&main_thread()), 1);
    }

    #[test]
    fn failed_put_leaves_history_untouched() {
        let mut cache = CacheInstance::default();
        cache.put(&entity(2, vec![("item", entity(1, vec![]))]), &[], true).unwrap();
        let two = cache.get(&main_thread(), &Uid::from(2)).unwrap().clone();
        let err = cache.put(&entity(1, vec![("back", two)]), &[], true).unwrap_err();
        assert!(matches!(err, StoreError::Graph(graph::GraphError::CycleDetected { .. })));
        assert_eq!(cache.length(&main_thread()), 2);
    }

    #[test]
    fn configure_only_before_writes() {
        let mut cache = CacheInstance::default();
        cache.set_field(UidField::new("id").unwrap()).unwrap();
        let r = cache
            .put(&Value::record([("id", Value::from("x"))]), &[], true)
            .unwrap();
        assert!(r.success);
        assert!(cache.get(&main_thread(), &Uid::from("x")).is_some());
        let err = cache.set_field(UidField::default()).unwrap_err();
        assert!(matches!(err, StoreError::IllegalOperation(_)));

        cache.reset();
        assert!(cache.set_field(UidField::default()).is_ok());
    }

    // -----------------------------------------------------------------------
    // History
    // -----------------------------------------------------------------------

    #[test]
    fn undo_redo_move_between_versions() {
        let mut cache = CacheInstance::default();
        cache.put(&note(1, "a"), &[], true).unwrap();
        cache.put(&note(1, "b"), &[], true).unwrap();

        let r = cache.undo(&main_thread());
        assert!(r.success);
        assert_eq!(text(&cache, &main_thread(), 1).as_deref(), Some("a"));
        assert!(r.thread(&main_thread()).unwrap().has_next);

        assert!(cache.undo(&main_thread()).success);
        assert!(cache.get(&main_thread(), &Uid::from(1)).is_none());
        assert!(!cache.undo(&main_thread()).success);

        assert!(cache.redo(&main_thread()).success);
        assert!(cache.redo(&main_thread()).success);
        assert_eq!(text(&cache, &main_thread(), 1).as_deref(), Some("b"));
        assert!(!cache.redo(&main_thread()).success);
    }

    #[test]
    fn unknown_thread_undo_is_noop() {
        let mut cache = CacheInstance::default();
        let r = cache.undo(&tid("ghost"));
        assert!(!r.success);
        assert!(r.threads.is_empty());
    }

    #[test]
    fn discarded_node_is_reclaimed() {
        let mut cache = CacheInstance::default();
        cache.put(&note(1, "a"), &[], true).unwrap();
        cache.put(&note(1, "b"), &[], true).unwrap();
        let third = cache.put(&note(1, "c"), &[], true).unwrap().node.unwrap();
        cache.undo(&main_thread());
        let fourth = cache.put(&note(1, "d"), &[], true).unwrap().node.unwrap();

        assert!(cache.node(third).is_none());
        assert!(cache.node_in(&main_thread(), third).is_none());
        assert!(cache.node_in(&main_thread(), fourth).is_some());
        assert_eq!(cache.length(&main_thread()), 4);
        assert_eq!(cache.node_count(), 4);
    }

    #[test]
    fn node_in_requires_membership() {
        let mut cache = CacheInstance::default();
        let side = tid("side");
        let n = cache.put(&note(1, "a"), &[side.clone()], true).unwrap().node.unwrap();
        assert!(cache.node_in(&side, n).is_some());
        assert!(cache.node_in(&main_thread(), n).is_none());
        assert!(cache.node(n).is_some());
    }

    #[test]
    fn prune_keeps_current_and_reclaims() {
        let mut cache = CacheInstance::default();
        for i in 0..5 {
            cache.put(&note(1, &i.to_string()), &[], true).unwrap();
        }
        assert_eq!(cache.prune(&main_thread(), 2), 4);
        assert_eq!(cache.length(&main_thread()), 2);
        assert_eq!(cache.node_count(), 2);
        assert_eq!(text(&cache, &main_thread(), 1).as_deref(), Some("4"));
        assert_eq!(cache.prune(&tid("ghost"), 1), 0);
    }

    #[test]
    fn pruning_to_one_node_still_counts_as_written() {
        let mut cache = CacheInstance::default();
        cache.put(&note(1, "a"), &[], true).unwrap();
        cache.prune(&main_thread(), 1);
        assert_eq!(cache.node_count(), 1);
        assert!(cache.has_history());
        assert!(cache.set_field(UidField::new("id").unwrap()).is_err());
        cache.reset();
        assert!(!cache.has_history());
        assert!(cache.set_field(UidField::new("id").unwrap()).is_ok());
    }

    #[test]
    fn reset_reinitializes_main() {
        let mut cache = CacheInstance::default();
        cache.put(&note(1, "a"), &[tid("side")], true).unwrap();
        cache.reset();
        assert_eq!(cache.threads().count(), 1);
        assert_eq!(cache.length(&main_thread()), 1);
        assert_eq!(cache.size(&main_thread()), 0);
        assert_eq!(cache.node_count(), 1);
    }

    // -----------------------------------------------------------------------
    // Threads
    // -----------------------------------------------------------------------

    #[test]
    fn branch_writes_stay_on_branch() {
        let mut cache = CacheInstance::default();
        cache.put(&note(1, "base"), &[], true).unwrap();
        let side = tid("side");
        let r = cache.put(&note(1, "branch"), &[side.clone()], true).unwrap();
        assert!(r.success);
        assert_eq!(r.thread(&side).unwrap().length, 2);
        assert!(r.thread(&main_thread()).is_none());

        assert_eq!(text(&cache, &main_thread(), 1).as_deref(), Some("base"));
        assert_eq!(text(&cache, &side, 1).as_deref(), Some("branch"));
        assert_eq!(cache.length(&main_thread()), 2);
    }

    #[test]
    fn multi_thread_write_shares_one_node() {
        let mut cache = CacheInstance::default();
        let side = tid("side");
        let r = cache.put(&note(1, "x"), &[main_thread(), side.clone()], true).unwrap();
        let node = r.node.unwrap();
        assert_eq!(cache.thread(&main_thread()).unwrap().current_node(), node);
        assert_eq!(cache.thread(&side).unwrap().current_node(), node);
        assert_eq!(cache.node(node).unwrap().owners().count(), 2);
    }

    #[test]
    fn close_thread_brings_final_values_to_main() {
        let mut cache = CacheInstance::default();
        cache.put(&note(1, "base"), &[], true).unwrap();
        let side = tid("side");
        cache.put(&note(1, "one"), &[side.clone()], true).unwrap();
        let two = cache.put(&note(1, "two"), &[side.clone()], true).unwrap().node.unwrap();
        let one = NodeId(two.0 - 1);

        let r = cache.close_thread(&side, &main_thread()).unwrap();
        assert!(r.success);
        assert_eq!(r.node, Some(two));
        assert!(cache.thread(&side).is_none());
        assert_eq!(text(&cache, &main_thread(), 1).as_deref(), Some("two"));
        // The intermediate branch node is gone.
        assert!(cache.node(one).is_none());
        assert_eq!(cache.length(&main_thread()), 3);
        assert!(cache.undo(&main_thread()).success);
        assert_eq!(text(&cache, &main_thread(), 1).as_deref(), Some("base"));
    }

    #[test]
    fn merge_thread_keeps_history_up_to_cursor() {
        let mut cache = CacheInstance::default();
        let side = tid("side");
        cache.put(&note(1, "one"), &[side.clone()], true).unwrap();
        cache.put(&note(1, "two"), &[side.clone()], true).unwrap();
        let undone = cache.put(&note(1, "three"), &[side.clone()], true).unwrap().node.unwrap();
        cache.undo(&side);

        let r = cache.merge_thread(&side, &main_thread()).unwrap();
        assert!(r.success);
        assert_eq!(r.thread(&main_thread()).unwrap().length, 3);
        assert!(cache.node(undone).is_none());
        assert_eq!(text(&cache, &main_thread(), 1).as_deref(), Some("two"));
        cache.undo(&main_thread());
        assert_eq!(text(&cache, &main_thread(), 1).as_deref(), Some("one"));
    }

    #[test]
    fn cut_thread_reclaims_branch_nodes() {
        let mut cache = CacheInstance::default();
        let side = tid("side");
        let n = cache.put(&note(1, "x"), &[side.clone()], true).unwrap().node.unwrap();
        let r = cache.cut_thread(&side).unwrap();
        assert!(r.success);
        assert!(r.thread(&side).is_none());
        assert_eq!(r.thread(&main_thread()).unwrap().length, 1);
        assert!(cache.node(n).is_none());
        assert!(cache.thread(&side).is_none());
        assert_eq!(cache.node_count(), 1);
        assert!(cache.get(&main_thread(), &Uid::from(1)).is_none());
    }

    #[test]
    fn thread_ops_on_main_are_illegal() {
        let mut cache = CacheInstance::default();
        assert!(matches!(
            cache.close_thread(&main_thread(), &main_thread()),
            Err(StoreError::IllegalOperation(_))
        ));
        assert!(cache.merge_thread(&main_thread(), &tid("x")).is_err());
        assert!(cache.cut_thread(&main_thread()).is_err());
        assert!(cache.close_thread(&tid("x"), &tid("x")).is_err());
    }

    #[test]
    fn thread_ops_on_unknown_threads_are_noops() {
        let mut cache = CacheInstance::default();
        assert!(!cache.close_thread(&tid("ghost"), &main_thread()).unwrap().success);
        assert!(!cache.merge_thread(&tid("ghost"), &main_thread()).unwrap().success);
        assert!(!cache.cut_thread(&tid("ghost")).unwrap().success);
    }

    proptest! {
        #[test]
        fn undo_redo_round_trip(texts in proptest::collection::vec("[a-z]{1,6}", 1..12)) {
            let mut cache = CacheInstance::default();
            let mut forward: Vec<Arc<Snapshot>> = Vec::new();
            for (i, t) in texts.iter().enumerate() {
                let parent = entity(100, vec![("child", note((i % 3) as i64, t))]);
                if cache.put(&parent, &[], true).unwrap().success {
                    forward.push(cache.snapshot(&main_thread()).unwrap().clone());
                }
            }
            while cache.undo(&main_thread()).success {}
            prop_assert_eq!(cache.size(&main_thread()), 0);
            for expected in &forward {
                prop_assert!(cache.redo(&main_thread()).success);
                let now = cache.snapshot(&main_thread()).unwrap();
                prop_assert!(Arc::ptr_eq(now, expected));
                for item in expected.items() {
                    prop_assert_eq!(now.entity(&item.uid), Some(&item.entity));
                }
            }
            prop_assert!(!cache.redo(&main_thread()).success);
        }
    }
}
