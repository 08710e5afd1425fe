//! Edge bookkeeping: adding and reconciling edges, collecting unreferenced
//! entities, and propagating new entity versions to their ancestors.

use std::collections::{HashSet, VecDeque};

use refcache_types::{path, Path, Uid};
use tracing::{debug, trace, warn};

use crate::clone::replace_entity;
use crate::context::FlushContext;
use crate::error::{GraphError, GraphResult};

/// Record the edge `parent --path--> child` on both items. Idempotent.
///
/// Cycles are not checked here: later entities of the same write may still
/// drop edges. See [`check_acyclic`].
pub fn assign_refs(parent: &Uid, child: &Uid, at: &Path, ctx: &mut FlushContext<'_>) -> GraphResult<()> {
    let parent_has = ctx.view(parent).is_some_and(|item| item.has_outgoing(child, at));
    let child_has = ctx.view(child).is_some_and(|item| item.has_incoming(parent, at));
    if !parent_has {
        ctx.edit(parent)?.add_outgoing(child, at);
    }
    if !child_has {
        ctx.edit(child)?.add_incoming(parent, at);
    }
    if !(parent_has && child_has) {
        trace!(%parent, %child, path = %at, "assigned edge");
    }
    Ok(())
}

/// Fail with [`GraphError::CycleDetected`] if the graph this write would
/// commit contains a cycle.
///
/// Runs once every entity of the write is indexed and reconciled. The live
/// graph is acyclic, so the search only starts from flushed items and follows
/// the latest version of every edge, skipping collected entities.
pub fn check_acyclic(ctx: &FlushContext<'_>) -> GraphResult<()> {
    let mut done: HashSet<&Uid> = HashSet::new();
    for root in ctx.flush_map().keys() {
        if done.contains(root) {
            continue;
        }
        let mut on_path: HashSet<&Uid> = HashSet::from([root]);
        let mut stack: Vec<(&Uid, Vec<&Uid>)> = vec![(root, children(root, ctx))];
        while let Some((uid, pending)) = stack.last_mut() {
            let Some(child) = pending.pop() else {
                on_path.remove(*uid);
                done.insert(*uid);
                stack.pop();
                continue;
            };
            if on_path.contains(child) {
                warn!(%child, "rejecting cyclic reference");
                return Err(GraphError::CycleDetected { uid: child.clone() });
            }
            if done.contains(child) {
                continue;
            }
            on_path.insert(child);
            stack.push((child, children(child, ctx)));
        }
    }
    Ok(())
}

/// Entities `uid` references in the graph being built.
fn children<'c>(uid: &Uid, ctx: &'c FlushContext<'_>) -> Vec<&'c Uid> {
    match ctx.view(uid) {
        Some(item) if !ctx.is_evicted(uid) => item
            .map_to
            .keys()
            .filter(|child| !ctx.is_evicted(child))
            .collect(),
        _ => Vec::new(),
    }
}

/// Drop every outgoing edge of `uid` whose path no longer leads to the
/// recorded child, removing the matching incoming edge from the child.
pub fn reconcile_outgoing(uid: &Uid, ctx: &mut FlushContext<'_>) -> GraphResult<()> {
    let field = ctx.field();
    let item = ctx
        .view(uid)
        .ok_or_else(|| GraphError::MissingItem(uid.clone()))?;
    let stale: Vec<(Uid, Path)> = item
        .outgoing()
        .into_iter()
        .filter(|(child, at)| {
            path::get(&item.entity, at).and_then(|v| field.uid_of(v)).as_ref() != Some(child)
        })
        .collect();
    if stale.is_empty() {
        return Ok(());
    }

    let item = ctx.edit(uid)?;
    for (child, at) in &stale {
        item.remove_outgoing(child, at);
    }
    for (child, at) in &stale {
        trace!(parent = %uid, %child, path = %at, "dropping stale edge");
        remove_incoming(child, uid, at, ctx)?;
    }
    Ok(())
}

/// Remove `parent --path--> child` from the child's incoming edges.
///
/// A child left without any referrer becomes a collection candidate; see
/// [`collect_orphans`].
pub fn remove_incoming(child: &Uid, parent: &Uid, at: &Path, ctx: &mut FlushContext<'_>) -> GraphResult<()> {
    let Some(item) = ctx.view(child) else {
        return Ok(());
    };
    if !item.has_incoming(parent, at) {
        return Ok(());
    }
    let item = ctx.edit(child)?;
    item.remove_incoming(parent, at);
    if !item.is_referenced() {
        ctx.orphans.push(child.clone());
    }
    Ok(())
}

/// Evict every candidate that is still unreferenced, cascading to the
/// entities it referenced.
///
/// Pinned entities (named directly by the write) are never collected.
pub fn collect_orphans(ctx: &mut FlushContext<'_>) -> GraphResult<()> {
    while let Some(uid) = ctx.orphans.pop() {
        if ctx.is_evicted(&uid) || ctx.pinned.contains(&uid) {
            continue;
        }
        match ctx.view(&uid) {
            Some(item) if !item.is_referenced() => {}
            _ => continue,
        }
        let item = ctx.retire(&uid)?;
        debug!(%uid, "collected unreferenced entity");
        for (child, at) in item.outgoing() {
            remove_incoming(&child, &uid, &at, ctx)?;
        }
    }
    Ok(())
}

/// Bring every ancestor of a changed entity up to date.
///
/// For each flushed item, each referencing parent is checked at the first
/// recorded path. If the parent still holds another version of the item
/// there, the parent is cloned with every occurrence replaced and is itself
/// queued, so changes travel to the roots within one flush.
pub fn propagate_dirty(ctx: &mut FlushContext<'_>) -> GraphResult<()> {
    let field = ctx.field();
    let mut queue: VecDeque<Uid> = ctx.flush_map().keys().cloned().collect();
    while let Some(uid) = queue.pop_front() {
        let Some(item) = ctx.flush_map().get(&uid) else {
            continue;
        };
        let entity = item.entity.clone();
        let parents: Vec<(Uid, Path)> = item
            .map_from
            .iter()
            .filter_map(|(parent, paths)| paths.first().map(|p| (parent.clone(), p.clone())))
            .collect();

        for (parent, first) in parents {
            if ctx.is_evicted(&parent) {
                continue;
            }
            let Some(parent_item) = ctx.view(&parent) else {
                continue;
            };
            if path::get(&parent_item.entity, &first).is_some_and(|v| v.same(&entity)) {
                continue;
            }
            let updated = replace_entity(&parent_item.entity, field, &uid, &entity);
            ctx.edit(&parent)?.entity = updated;
            trace!(%parent, child = %uid, "propagated new version to parent");
            queue.push_back(parent);
        }
    }
    Ok(())
}
