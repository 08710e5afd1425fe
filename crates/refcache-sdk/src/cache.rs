//! The [`Cache`] facade: a lock-guarded [`CacheInstance`] plus its
//! configuration, with lookups by uid, entity or list of either.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use refcache_graph::editable_copy;
use refcache_store::{CacheInstance, NodeId, OpResult, ThreadId, ThreadState};
use refcache_types::{Uid, UidField, Value};
use serde_json::json;
use tracing::debug;

use crate::config::CacheConfig;
use crate::error::{SdkError, SdkResult};

#[derive(Debug)]
struct State {
    instance: CacheInstance,
    config: CacheConfig,
}

impl State {
    /// Apply `max_history` to every thread a write touched.
    fn trim(&mut self, result: &mut OpResult) {
        let Some(max) = self.config.max_history else {
            return;
        };
        let touched: Vec<ThreadId> = result.threads.keys().cloned().collect();
        for id in touched {
            if self.instance.prune(&id, max) == 0 {
                continue;
            }
            if let Some(state) = self.instance.thread_state(&id) {
                result.threads.insert(id, state);
            }
        }
    }
}

/// A versioned, normalized entity cache.
///
/// Every method takes `&self`; calls are serialized by an internal lock, so a
/// `Cache` can be shared between threads behind an `Arc`.
#[derive(Debug)]
pub struct Cache {
    state: RwLock<State>,
}

impl Cache {
    /// A cache with the default configuration.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State {
                instance: CacheInstance::new(UidField::default()),
                config: CacheConfig::default(),
            }),
        }
    }

    /// Create a cache with `config`, validating it first.
    pub fn with_config(config: CacheConfig) -> SdkResult<Self> {
        config.validate()?;
        let instance = CacheInstance::new(config.field()?);
        Ok(Self {
            state: RwLock::new(State { instance, config }),
        })
    }

    fn read(&self) -> SdkResult<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|e| SdkError::LockPoisoned(e.to_string()))
    }

    fn write(&self) -> SdkResult<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|e| SdkError::LockPoisoned(e.to_string()))
    }

    // ---- Configuration ----

    /// The current configuration.
    pub fn config(&self) -> SdkResult<CacheConfig> {
        Ok(self.read()?.config.clone())
    }

    /// Replace the configuration. Fails once anything has been written.
    pub fn configure(&self, config: CacheConfig) -> SdkResult<()> {
        config.validate()?;
        let field = config.field()?;
        let mut state = self.write()?;
        state.instance.set_field(field)?;
        debug!(uid_field = %config.uid_field, max_history = ?config.max_history, "configured cache");
        state.config = config;
        Ok(())
    }

    // ---- Writes ----

    /// Write `value` to `main`, replacing stored versions of its entities.
    pub fn put(&self, value: &Value) -> SdkResult<OpResult> {
        self.put_in(value, &[], true)
    }

    /// Write `value` to `threads` (`main` when empty).
    ///
    /// With `strong = false`, entities already stored are kept as they are
    /// and only new ones are added.
    pub fn put_in(&self, value: &Value, threads: &[ThreadId], strong: bool) -> SdkResult<OpResult> {
        let mut state = self.write()?;
        let mut result = state.instance.put(value, threads, strong)?;
        if result.success {
            state.trim(&mut result);
        }
        Ok(result)
    }

    /// Evict `uids` from `main`.
    pub fn evict(&self, uids: &[Uid]) -> SdkResult<OpResult> {
        self.evict_in(uids, &[])
    }

    /// Evict `uids` from `threads` (`main` when empty).
    pub fn evict_in(&self, uids: &[Uid], threads: &[ThreadId]) -> SdkResult<OpResult> {
        let mut state = self.write()?;
        let mut result = state.instance.evict(uids, threads)?;
        if result.success {
            state.trim(&mut result);
        }
        Ok(result)
    }

    /// Evict the entities named by `keys`: a uid, an entity, or a list of
    /// either.
    pub fn evict_values(&self, keys: &Value) -> SdkResult<OpResult> {
        self.evict_values_in(keys, &[])
    }

    /// Evict by uid or entity from `threads` (`main` when empty).
    pub fn evict_values_in(&self, keys: &Value, threads: &[ThreadId]) -> SdkResult<OpResult> {
        let uids = {
            let state = self.read()?;
            key_uids(state.instance.field(), keys)?
        };
        self.evict_in(&uids, threads)
    }

    // ---- Reads ----

    /// The stored entity `uid` on `main`.
    pub fn get(&self, uid: &Uid) -> SdkResult<Option<Value>> {
        self.get_in(uid, &ThreadId::main())
    }

    /// The entity `uid` at `thread`'s cursor.
    pub fn get_in(&self, uid: &Uid, thread: &ThreadId) -> SdkResult<Option<Value>> {
        Ok(self.read()?.instance.get(thread, uid).cloned())
    }

    /// Resolve `keys` against `thread`.
    ///
    /// A uid or entity yields the stored entity or `Null`; a list yields a
    /// list of those results in the same order.
    pub fn lookup(&self, keys: &Value, thread: &ThreadId) -> SdkResult<Value> {
        let state = self.read()?;
        let field = state.instance.field();
        let one = |key: &Value| -> SdkResult<Value> {
            let uid = key_uid(field, key)?;
            Ok(state.instance.get(thread, &uid).cloned().unwrap_or_default())
        };
        match keys {
            Value::List(items) => Ok(Value::from_list(
                items.iter().map(one).collect::<SdkResult<Vec<_>>>()?,
            )),
            key => one(key),
        }
    }

    /// An editable copy of `uid` on `main`.
    ///
    /// The returned value and its embedded records and lists are fresh
    /// allocations; nested entities are still shared with the cache.
    pub fn get_edit(&self, uid: &Uid) -> SdkResult<Option<Value>> {
        self.get_edit_in(uid, &ThreadId::main())
    }

    /// An editable copy of entity `uid` at `thread`'s cursor.
    pub fn get_edit_in(&self, uid: &Uid, thread: &ThreadId) -> SdkResult<Option<Value>> {
        let state = self.read()?;
        let field = state.instance.field();
        Ok(state
            .instance
            .get(thread, uid)
            .map(|entity| editable_copy(entity, field)))
    }

    /// The entity `uid` as it was in `node`, if `thread` still holds it.
    pub fn get_at(&self, thread: &ThreadId, node: NodeId, uid: &Uid) -> SdkResult<Option<Value>> {
        let state = self.read()?;
        Ok(state
            .instance
            .node_in(thread, node)
            .and_then(|n| n.snapshot.entity(uid).cloned()))
    }

    /// Number of entities at `thread`'s cursor.
    pub fn size(&self, thread: &ThreadId) -> SdkResult<usize> {
        Ok(self.read()?.instance.size(thread))
    }

    /// Number of nodes in `thread`.
    pub fn length(&self, thread: &ThreadId) -> SdkResult<usize> {
        Ok(self.read()?.instance.length(thread))
    }

    // ---- History ----

    /// Step `thread` back one node.
    pub fn undo(&self, thread: &ThreadId) -> SdkResult<OpResult> {
        Ok(self.write()?.instance.undo(thread))
    }

    /// Step `thread` forward one node.
    pub fn redo(&self, thread: &ThreadId) -> SdkResult<OpResult> {
        Ok(self.write()?.instance.redo(thread))
    }

    /// Fold `id` onto `target`, keeping its first and current nodes.
    pub fn close_thread(&self, id: &ThreadId, target: &ThreadId) -> SdkResult<OpResult> {
        Ok(self.write()?.instance.close_thread(id, target)?)
    }

    /// Fold `id` onto `target`, keeping its history up to the cursor.
    pub fn merge_thread(&self, id: &ThreadId, target: &ThreadId) -> SdkResult<OpResult> {
        Ok(self.write()?.instance.merge_thread(id, target)?)
    }

    /// Abandon thread `id`.
    pub fn cut_thread(&self, id: &ThreadId) -> SdkResult<OpResult> {
        Ok(self.write()?.instance.cut_thread(id)?)
    }

    /// Cursor summary of thread `id`.
    pub fn thread_state(&self, id: &ThreadId) -> SdkResult<Option<ThreadState>> {
        Ok(self.read()?.instance.thread_state(id))
    }

    /// Ids of every open thread.
    pub fn threads(&self) -> SdkResult<Vec<ThreadId>> {
        Ok(self
            .read()?
            .instance
            .threads()
            .map(|t| t.id().clone())
            .collect())
    }

    /// Drop all history and entities. The configuration is kept.
    pub fn reset(&self) -> SdkResult<()> {
        self.write()?.instance.reset();
        Ok(())
    }

    /// Threads, cursors and the entities visible on `main`, as JSON.
    pub fn dump(&self) -> SdkResult<serde_json::Value> {
        let state = self.read()?;
        let threads: serde_json::Map<String, serde_json::Value> = state
            .instance
            .threads()
            .map(|t| {
                let nodes: Vec<u64> = t.nodes().iter().map(|n| n.as_u64()).collect();
                (
                    t.id().to_string(),
                    json!({
                        "nodes": nodes,
                        "current": t.current(),
                        "has_prev": t.has_prev(),
                        "has_next": t.has_next(),
                    }),
                )
            })
            .collect();
        let entities: serde_json::Map<String, serde_json::Value> = state
            .instance
            .snapshot(&ThreadId::main())
            .map(|s| {
                s.items()
                    .map(|item| (item.uid.to_string(), item.entity.to_json()))
                    .collect()
            })
            .unwrap_or_default();
        Ok(json!({
            "uid_field": state.config.uid_field,
            "nodes": state.instance.node_count(),
            "threads": threads,
            "entities": entities,
        }))
    }
}

impl Default for Cache {
    fn default() -> Self {
        Self::new()
    }
}

/// The uid named by a lookup key: a string or integer uid, or an entity.
fn key_uid(field: &UidField, key: &Value) -> SdkResult<Uid> {
    match key {
        Value::String(_) | Value::Int(_) | Value::Float(_) => Uid::from_scalar(key)
            .ok_or_else(|| SdkError::InvalidArgument(format!("not a finite uid: {key}"))),
        Value::Record(_) => field.uid_of(key).ok_or_else(|| {
            SdkError::InvalidArgument(format!("record has no {:?} field: {key}", field.name()))
        }),
        other => Err(SdkError::InvalidArgument(format!("not a uid or entity: {other}"))),
    }
}

fn key_uids(field: &UidField, keys: &Value) -> SdkResult<Vec<Uid>> {
    match keys {
        Value::List(items) => items.iter().map(|k| key_uid(field, k)).collect(),
        key => Ok(vec![key_uid(field, key)?]),
    }
}
