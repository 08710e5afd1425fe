//! Removal of entities from the graph.
//!
//! Evicting an entity detaches it from both sides: its children lose an
//! incoming edge (and are collected if nothing else references them), and its
//! parents get a copy with every location that held it deleted. Parents
//! altered this way are re-indexed, since a list splice shifts the paths of
//! the references that remain.

use std::collections::HashSet;

use refcache_types::{path, Path, Uid};
use tracing::debug;

use crate::context::FlushContext;
use crate::error::GraphResult;
use crate::parser;
use crate::references;

/// Stage the eviction of `uids` into `ctx`.
///
/// Uids missing from the live snapshot are skipped. Returns `false`, staging
/// nothing, when none of them exist.
pub fn evict(uids: &[Uid], ctx: &mut FlushContext<'_>) -> GraphResult<bool> {
    let mut targets: Vec<&Uid> = Vec::new();
    for uid in uids {
        if ctx.live().contains(uid) && !targets.contains(&uid) {
            targets.push(uid);
        }
    }
    if targets.is_empty() {
        return Ok(false);
    }
    let target_set: HashSet<&Uid> = targets.iter().copied().collect();

    let mut touched: Vec<Uid> = Vec::new();
    for uid in targets.iter().copied() {
        if ctx.is_evicted(uid) {
            continue;
        }
        let item = ctx.retire(uid)?;
        debug!(%uid, "evicting entity");

        for (child, at) in item.outgoing() {
            references::remove_incoming(&child, uid, &at, ctx)?;
        }

        for (parent, paths) in &item.map_from {
            if target_set.contains(parent) || ctx.is_evicted(parent) {
                continue;
            }
            detach_from_parent(parent, uid, paths, ctx)?;
            if !touched.contains(parent) {
                touched.push(parent.clone());
            }
        }
    }

    references::collect_orphans(ctx)?;
    for parent in &touched {
        if !ctx.is_evicted(parent) {
            parser::reparse(parent, ctx)?;
        }
    }
    references::collect_orphans(ctx)?;
    references::propagate_dirty(ctx)?;
    Ok(true)
}

fn detach_from_parent(parent: &Uid, child: &Uid, paths: &[Path], ctx: &mut FlushContext<'_>) -> GraphResult<()> {
    let item = ctx.edit(parent)?;
    item.entity = path::delete_all(&item.entity, paths);
    item.map_to.remove(child);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::CacheItem;
    use crate::snapshot::Snapshot;
    use refcache_types::{UidField, Value};

    fn entity(uid: i64, fields: Vec<(&str, Value)>) -> Value {
        let mut all = vec![("uid", Value::from(uid))];
        all.extend(fields);
        Value::record(all)
    }

    fn p(s: &str) -> Path {
        Path::parse(s).unwrap()
    }

    fn link(parent: &mut CacheItem, child: &mut CacheItem, at: &str) {
        parent.add_outgoing(&child.uid, &p(at));
        child.add_incoming(&parent.uid, &p(at));
    }

    #[test]
    fn unknown_uids_stage_nothing() {
        let live = Snapshot::new();
        let field = UidField::default();
        let mut ctx = FlushContext::new(&live, &field);
        assert!(!evict(&[Uid::from("ghost")], &mut ctx).unwrap());
        assert!(!ctx.has_changes());
    }

    #[test]
    fn parent_list_is_spliced_and_reindexed() {
        let a = entity(1, vec![]);
        let b = entity(2, vec![]);
        let parent = entity(9, vec![("items", Value::list([a.clone(), b.clone()]))]);
        let mut ia = CacheItem::new(Uid::from(1), a);
        let mut ib = CacheItem::new(Uid::from(2), b.clone());
        let mut ip = CacheItem::new(Uid::from(9), parent);
        link(&mut ip, &mut ia, "items.0");
        link(&mut ip, &mut ib, "items.1");
        let live: Snapshot = [ia, ib, ip].into_iter().collect();

        let field = UidField::default();
        let mut ctx = FlushContext::new(&live, &field);
        assert!(evict(&[Uid::from(1)], &mut ctx).unwrap());

        assert!(ctx.is_evicted(&Uid::from(1)));
        let flush = ctx.flush_map();
        let new_parent = flush.get(&Uid::from(9)).unwrap();
        let items = new_parent.entity.field("items").and_then(Value::as_list).unwrap();
        assert_eq!(items.len(), 1);
        assert!(items[0].same(&b));
        assert_eq!(new_parent.map_to.get(&Uid::from(2)), Some(&vec![p("items.0")]));
        assert!(!new_parent.map_to.contains_key(&Uid::from(1)));

        let child = flush.get(&Uid::from(2)).unwrap();
        assert_eq!(child.map_from.get(&Uid::from(9)), Some(&vec![p("items.0")]));
    }

    #[test]
    fn orphaned_children_cascade() {
        let a = entity(1, vec![]);
        let b = entity(2, vec![("item", a.clone())]);
        let c = entity(3, vec![("item", b.clone())]);
        let mut ia = CacheItem::new(Uid::from(1), a);
        let mut ib = CacheItem::new(Uid::from(2), b);
        let mut ic = CacheItem::new(Uid::from(3), c);
        link(&mut ib, &mut ia, "item");
        link(&mut ic, &mut ib, "item");
        let live: Snapshot = [ia, ib, ic].into_iter().collect();

        let field = UidField::default();
        let mut ctx = FlushContext::new(&live, &field);
        evict(&[Uid::from(3)], &mut ctx).unwrap();
        for uid in [1, 2, 3] {
            assert!(ctx.is_evicted(&Uid::from(uid)));
        }
        assert!(ctx.flush_map().is_empty());
    }

    #[test]
    fn shared_child_survives_while_referenced() {
        let a = entity(1, vec![]);
        let b = entity(2, vec![("item", a.clone())]);
        let c = entity(3, vec![("item", a.clone())]);
        let mut ia = CacheItem::new(Uid::from(1), a);
        let mut ib = CacheItem::new(Uid::from(2), b);
        let mut ic = CacheItem::new(Uid::from(3), c);
        link(&mut ib, &mut ia, "item");
        link(&mut ic, &mut ia, "item");
        let live: Snapshot = [ia, ib, ic].into_iter().collect();

        let field = UidField::default();
        let mut ctx = FlushContext::new(&live, &field);
        evict(&[Uid::from(2)], &mut ctx).unwrap();
        assert!(ctx.is_evicted(&Uid::from(2)));
        assert!(!ctx.is_evicted(&Uid::from(1)));
        let one = ctx.flush_map().get(&Uid::from(1)).unwrap();
        assert!(!one.map_from.contains_key(&Uid::from(2)));
        assert!(one.map_from.contains_key(&Uid::from(3)));
    }

    #[test]
    fn grandparents_receive_the_detached_parent() {
        let a = entity(1, vec![]);
        let b = entity(2, vec![("item", a.clone())]);
        let c = entity(3, vec![("item", b.clone())]);
        let mut ia = CacheItem::new(Uid::from(1), a);
        let mut ib = CacheItem::new(Uid::from(2), b);
        let mut ic = CacheItem::new(Uid::from(3), c);
        link(&mut ib, &mut ia, "item");
        link(&mut ic, &mut ib, "item");
        let live: Snapshot = [ia, ib, ic].into_iter().collect();

        let field = UidField::default();
        let mut ctx = FlushContext::new(&live, &field);
        evict(&[Uid::from(1)], &mut ctx).unwrap();

        let flush = ctx.flush_map();
        let b2 = &flush.get(&Uid::from(2)).unwrap().entity;
        assert!(b2.field("item").is_none());
        let c2 = &flush.get(&Uid::from(3)).unwrap().entity;
        assert!(c2.field("item").unwrap().same(b2));
    }
}
