//! The transient working set of one write.
//!
//! A [`FlushContext`] reads the live snapshot but never mutates it. Items
//! touched by the write are cloned into the flush map (changed or new) or
//! moved into the evict map (collected). Discarding the context discards the
//! write.

use std::collections::HashSet;

use refcache_types::{Uid, UidField, Value};
use tracing::trace;

use crate::error::{GraphError, GraphResult};
use crate::item::CacheItem;
use crate::snapshot::Snapshot;
use crate::version_map::VersionMap;

pub struct FlushContext<'a> {
    live: &'a Snapshot,
    field: &'a UidField,
    strong: bool,
    flush: VersionMap<CacheItem>,
    evict: VersionMap<CacheItem>,
    /// Uids already resolved by the parser in this pass (first come, first served).
    pub(crate) resolved: HashSet<Uid>,
    /// Entities the parser is currently inside of, outermost first.
    pub(crate) walking: Vec<Uid>,
    /// Entities named without a parent in this write; never collected by it.
    pub(crate) pinned: HashSet<Uid>,
    /// Entities that lost an incoming edge and may now be unreferenced.
    pub(crate) orphans: Vec<Uid>,
}

impl<'a> FlushContext<'a> {
    /// A strong-write context over `live`.
    pub fn new(live: &'a Snapshot, field: &'a UidField) -> Self {
        Self {
            live,
            field,
            strong: true,
            flush: VersionMap::new(),
            evict: VersionMap::new(),
            resolved: HashSet::new(),
            walking: Vec::new(),
            pinned: HashSet::new(),
            orphans: Vec::new(),
        }
    }

    /// When `strong` is false, entities already in the live snapshot are kept
    /// as stored and incoming instances of them are ignored.
    pub fn with_strong(mut self, strong: bool) -> Self {
        self.strong = strong;
        self
    }

    /// The snapshot this write starts from.
    pub fn live(&self) -> &'a Snapshot {
        self.live
    }

    /// The uid field entities are recognized by.
    pub fn field(&self) -> &'a UidField {
        self.field
    }

    /// Whether incoming entities replace stored ones.
    pub fn is_strong(&self) -> bool {
        self.strong
    }

    /// Items changed or created by this write.
    pub fn flush_map(&self) -> &VersionMap<CacheItem> {
        &self.flush
    }

    /// Items removed by this write.
    pub fn evict_map(&self) -> &VersionMap<CacheItem> {
        &self.evict
    }

    /// Whether committing would change the live snapshot.
    pub fn has_changes(&self) -> bool {
        !self.flush.is_empty() || self.evict.keys().any(|uid| self.live.contains(uid))
    }

    /// The most recent version of an item: flushed, evicted, or live.
    pub fn view(&self, uid: &Uid) -> Option<&CacheItem> {
        self.flush
            .get(uid)
            .or_else(|| self.evict.get(uid))
            .or_else(|| self.live.item(uid).map(|item| item.as_ref()))
    }

    /// Whether this write has removed `uid`.
    pub fn is_evicted(&self, uid: &Uid) -> bool {
        self.evict.contains(uid)
    }

    /// A writable copy of an item, cloned from the live snapshot on first
    /// touch.
    pub(crate) fn edit(&mut self, uid: &Uid) -> GraphResult<&mut CacheItem> {
        if self.flush.contains(uid) {
            return self
                .flush
                .get_mut(uid)
                .ok_or_else(|| GraphError::MissingItem(uid.clone()));
        }
        if self.evict.contains(uid) {
            return self
                .evict
                .get_mut(uid)
                .ok_or_else(|| GraphError::MissingItem(uid.clone()));
        }
        let item = self
            .live
            .item(uid)
            .ok_or_else(|| GraphError::MissingItem(uid.clone()))?;
        self.flush.insert(uid.clone(), CacheItem::clone(item));
        self.flush
            .get_mut(uid)
            .ok_or_else(|| GraphError::MissingItem(uid.clone()))
    }

    /// Place `entity` as the new value of `uid` in the flush map, creating
    /// the item if it is new and bringing it back if it had been collected.
    pub(crate) fn stage(&mut self, uid: &Uid, entity: Value) -> GraphResult<()> {
        if let Some(mut item) = self.evict.remove(uid) {
            trace!(%uid, "restoring collected entity");
            item.entity = entity;
            self.flush.insert(uid.clone(), item);
            return Ok(());
        }
        if !self.flush.contains(uid) {
            let item = match self.live.item(uid) {
                Some(live) => CacheItem::clone(live),
                None => CacheItem::new(uid.clone(), Value::Null),
            };
            self.flush.insert(uid.clone(), item);
        }
        self.edit(uid)?.entity = entity;
        Ok(())
    }

    /// Move an item into the evict map and return its last version.
    pub(crate) fn retire(&mut self, uid: &Uid) -> GraphResult<CacheItem> {
        if let Some(item) = self.evict.get(uid) {
            return Ok(item.clone());
        }
        let item = match self.flush.remove(uid) {
            Some(item) => item,
            None => self
                .live
                .item(uid)
                .map(|item| CacheItem::clone(item))
                .ok_or_else(|| GraphError::MissingItem(uid.clone()))?,
        };
        self.evict.insert(uid.clone(), item.clone());
        Ok(item)
    }

    pub(crate) fn into_maps(self) -> (VersionMap<CacheItem>, VersionMap<CacheItem>) {
        (self.flush, self.evict)
    }
}
