//! Immutable cache states shared between history nodes.

use std::sync::Arc;

use refcache_types::{Uid, Value};

use crate::item::CacheItem;
use crate::version_map::VersionMap;

/// The entire cache state at one point in history.
///
/// A snapshot maps uids to shared, immutable [`CacheItem`]s. Producing the
/// next snapshot copies the table but shares every item it does not replace.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    items: VersionMap<Arc<CacheItem>>,
}

impl Snapshot {
    /// An empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entities.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether `uid` is stored.
    pub fn contains(&self, uid: &Uid) -> bool {
        self.items.contains(uid)
    }

    /// The stored item for `uid`, edges included.
    pub fn item(&self, uid: &Uid) -> Option<&Arc<CacheItem>> {
        self.items.get(uid)
    }

    /// The stored entity for `uid`.
    pub fn entity(&self, uid: &Uid) -> Option<&Value> {
        self.items.get(uid).map(|item| &item.entity)
    }

    /// Uids in insertion order.
    pub fn uids(&self) -> impl Iterator<Item = &Uid> {
        self.items.keys()
    }

    /// Every stored item.
    pub fn items(&self) -> impl Iterator<Item = &Arc<CacheItem>> {
        self.items.values()
    }

    pub(crate) fn insert(&mut self, item: CacheItem) {
        self.items.insert(item.uid.clone(), Arc::new(item));
    }

    pub(crate) fn remove(&mut self, uid: &Uid) -> bool {
        self.items.remove(uid).is_some()
    }
}

impl FromIterator<CacheItem> for Snapshot {
    fn from_iter<I: IntoIterator<Item = CacheItem>>(iter: I) -> Self {
        let mut snapshot = Self::new();
        for item in iter {
            snapshot.insert(item);
        }
        snapshot
    }
}
