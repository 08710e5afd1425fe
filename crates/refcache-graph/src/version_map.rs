//! Insertion-ordered, mutation-counted map keyed by uid.
//!
//! [`VersionMap`] is the entity table of every snapshot and the working set
//! of every flush. Iteration follows first-insertion order; replacing the
//! value of an existing key keeps its position. Every mutation bumps
//! [`VersionMap::version`].

use std::collections::{BTreeMap, HashMap};

use refcache_types::Uid;

#[derive(Clone, Debug)]
pub struct VersionMap<V> {
    entries: HashMap<Uid, (u64, V)>,
    order: BTreeMap<u64, Uid>,
    next_seq: u64,
    version: u64,
}

impl<V> VersionMap<V> {
    /// Create an empty map at version 0.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            order: BTreeMap::new(),
            next_seq: 0,
            version: 0,
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of mutations applied since creation.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Whether `uid` has an entry.
    pub fn contains(&self, uid: &Uid) -> bool {
        self.entries.contains_key(uid)
    }

    /// The entry for `uid`.
    pub fn get(&self, uid: &Uid) -> Option<&V> {
        self.entries.get(uid).map(|(_, v)| v)
    }

    /// Mutable access. Counts as a mutation when the key exists.
    pub fn get_mut(&mut self, uid: &Uid) -> Option<&mut V> {
        let entry = self.entries.get_mut(uid)?;
        self.version += 1;
        Some(&mut entry.1)
    }

    /// Insert or replace, returning the previous value.
    pub fn insert(&mut self, uid: Uid, value: V) -> Option<V> {
        self.version += 1;
        if let Some(entry) = self.entries.get_mut(&uid) {
            return Some(std::mem::replace(&mut entry.1, value));
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.order.insert(seq, uid.clone());
        self.entries.insert(uid, (seq, value));
        None
    }

    /// Remove the entry for `uid`, bumping the version if one existed.
    pub fn remove(&mut self, uid: &Uid) -> Option<V> {
        let (seq, value) = self.entries.remove(uid)?;
        self.order.remove(&seq);
        self.version += 1;
        Some(value)
    }

    pub fn clear(&mut self) {
        if !self.is_empty() {
            self.version += 1;
        }
        self.entries.clear();
        self.order.clear();
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &Uid> {
        self.order.values()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Uid, &V)> {
        self.order
            .values()
            .filter_map(|uid| self.entries.get_key_value(uid).map(|(k, (_, v))| (k, v)))
    }

    /// Values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, v)| v)
    }

    /// Consume the map, yielding entries in insertion order.
    pub fn into_entries(mut self) -> Vec<(Uid, V)> {
        let order = std::mem::take(&mut self.order);
        order
            .into_values()
            .filter_map(|uid| self.entries.remove(&uid).map(|(_, v)| (uid, v)))
            .collect()
    }
}

impl<V> Default for VersionMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> FromIterator<(Uid, V)> for VersionMap<V> {
    fn from_iter<I: IntoIterator<Item = (Uid, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (uid, value) in iter {
            map.insert(uid, value);
        }
        map
    }
}
