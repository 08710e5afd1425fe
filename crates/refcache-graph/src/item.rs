//! The per-entity record: the entity value plus both directions of its edges.
//!
//! An edge `(parent, path, child)` is stored twice: as `path` in
//! `parent.map_to[child]` and as `path` in `child.map_from[parent]`. The path
//! is always relative to the parent entity. Within one snapshot the two
//! copies agree.

use std::collections::BTreeMap;

use refcache_types::{Path, Uid, Value};

/// Uid of the entity at the other end of an edge, mapped to the ordered,
/// duplicate-free list of paths the edge occurs at.
pub type RefMap = BTreeMap<Uid, Vec<Path>>;

/// One stored entity and its edges.
///
/// Once committed into a snapshot an item is never mutated; a change produces
/// a cloned successor.
#[derive(Clone, Debug, PartialEq)]
pub struct CacheItem {
    /// Uid of the stored entity.
    pub uid: Uid,
    /// The entity value.
    pub entity: Value,
    /// Outgoing edges: child uid -> paths inside this entity.
    pub map_to: RefMap,
    /// Incoming edges: parent uid -> paths inside that parent.
    pub map_from: RefMap,
}

impl CacheItem {
    /// An item with no edges.
    pub fn new(uid: Uid, entity: Value) -> Self {
        Self {
            uid,
            entity,
            map_to: RefMap::new(),
            map_from: RefMap::new(),
        }
    }

    /// Record that `child` is found at `path` inside this entity.
    ///
    /// Returns `false` if the edge was already recorded.
    pub fn add_outgoing(&mut self, child: &Uid, path: &Path) -> bool {
        add_path(&mut self.map_to, child, path)
    }

    /// Record that this entity is found at `path` inside `parent`.
    ///
    /// Returns `false` if the edge was already recorded.
    pub fn add_incoming(&mut self, parent: &Uid, path: &Path) -> bool {
        add_path(&mut self.map_from, parent, path)
    }

    /// Drop one outgoing path, deleting the child's entry once it is empty.
    pub fn remove_outgoing(&mut self, child: &Uid, path: &Path) -> bool {
        remove_path(&mut self.map_to, child, path)
    }

    /// Drop one incoming path, deleting the parent's entry once it is empty.
    pub fn remove_incoming(&mut self, parent: &Uid, path: &Path) -> bool {
        remove_path(&mut self.map_from, parent, path)
    }

    /// Whether this item references `child` at `path`.
    pub fn has_outgoing(&self, child: &Uid, path: &Path) -> bool {
        self.map_to.get(child).is_some_and(|paths| paths.contains(path))
    }

    /// Whether `parent` references this item at `path`.
    pub fn has_incoming(&self, parent: &Uid, path: &Path) -> bool {
        self.map_from
            .get(parent)
            .is_some_and(|paths| paths.contains(path))
    }

    /// Whether any entity still references this one.
    pub fn is_referenced(&self) -> bool {
        !self.map_from.is_empty()
    }

    /// Every outgoing edge as `(child, path)` pairs.
    pub fn outgoing(&self) -> Vec<(Uid, Path)> {
        flatten(&self.map_to)
    }

    /// Every incoming edge as `(parent, path)` pairs.
    pub fn incoming(&self) -> Vec<(Uid, Path)> {
        flatten(&self.map_from)
    }
}

fn add_path(map: &mut RefMap, uid: &Uid, path: &Path) -> bool {
    let paths = map.entry(uid.clone()).or_default();
    if paths.contains(path) {
        return false;
    }
    paths.push(path.clone());
    true
}

fn remove_path(map: &mut RefMap, uid: &Uid, path: &Path) -> bool {
    let Some(paths) = map.get_mut(uid) else {
        return false;
    };
    let before = paths.len();
    paths.retain(|p| p != path);
    let removed = paths.len() != before;
    if paths.is_empty() {
        map.remove(uid);
    }
    removed
}

fn flatten(map: &RefMap) -> Vec<(Uid, Path)> {
    map.iter()
        .flat_map(|(uid, paths)| paths.iter().map(move |p| (uid.clone(), p.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(uid: &str) -> CacheItem {
        CacheItem::new(Uid::from(uid), Value::record([("uid", Value::from(uid))]))
    }

    fn path(s: &str) -> Path {
        Path::parse(s).unwrap()
    }

    #[test]
    fn add_is_idempotent() {
        let mut parent = item("p");
        let child = Uid::from("c");
        assert!(parent.add_outgoing(&child, &path("item")));
        assert!(!parent.add_outgoing(&child, &path("item")));
        assert!(parent.add_outgoing(&child, &path("list.0")));
        assert_eq!(parent.map_to[&child], vec![path("item"), path("list.0")]);
    }

    #[test]
    fn remove_last_path_drops_entry() {
        let mut child = item("c");
        let parent = Uid::from("p");
        child.add_incoming(&parent, &path("item"));
        assert!(child.is_referenced());

        assert!(!child.remove_incoming(&parent, &path("other")));
        assert!(child.remove_incoming(&parent, &path("item")));
        assert!(!child.map_from.contains_key(&parent));
        assert!(!child.is_referenced());
    }

    #[test]
    fn has_edge_queries() {
        let mut parent = item("p");
        let child = Uid::from("c");
        parent.add_outgoing(&child, &path("a.b"));
        assert!(parent.has_outgoing(&child, &path("a.b")));
        assert!(!parent.has_outgoing(&child, &path("a")));
        assert!(!parent.has_incoming(&child, &path("a.b")));
    }

    #[test]
    fn flatten_preserves_path_order() {
        let mut parent = item("p");
        parent.add_outgoing(&Uid::from("c"), &path("x"));
        parent.add_outgoing(&Uid::from("c"), &path("y"));
        parent.add_outgoing(&Uid::from("b"), &path("z"));
        let out = parent.outgoing();
        assert_eq!(
            out,
            vec![
                (Uid::from("b"), path("z")),
                (Uid::from("c"), path("x")),
                (Uid::from("c"), path("y")),
            ]
        );
        assert!(parent.remove_outgoing(&Uid::from("b"), &path("z")));
        assert_eq!(parent.outgoing().len(), 2);
    }
}
