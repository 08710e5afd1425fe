//! Entity discovery for a write.
//!
//! The parser walks an input value, finds every uid-bearing record, and stages
//! each one in the flush context together with the edges that lead to it. It
//! returns the *resolved* value: the input with later duplicates of an entity
//! replaced by the first instance seen, so the stored tree never holds two
//! allocations for one uid.
//!
//! Entities whose incoming instance is identical to the live one are not
//! walked again. Repeated writes of an unchanged tree therefore cost one
//! identity check per top-level entity.

use refcache_types::{Path, Record, Uid, Value};
use tracing::{trace, warn};

use crate::context::FlushContext;
use crate::error::{GraphError, GraphResult};
use crate::references;

/// Parse a write's input value into `ctx`.
///
/// Entities reached without passing through another entity (the value itself,
/// members of a top-level list, entities inside embedded top-level records)
/// have no parent edge and are pinned for the duration of the write.
pub fn parse(value: &Value, ctx: &mut FlushContext<'_>) -> GraphResult<Value> {
    walk(value, &Path::root(), None, ctx)
}

/// Re-index an entity that is already staged, regardless of whether its
/// value matches the live snapshot.
pub(crate) fn reparse(uid: &Uid, ctx: &mut FlushContext<'_>) -> GraphResult<Value> {
    let entity = ctx
        .view(uid)
        .map(|item| item.entity.clone())
        .ok_or_else(|| GraphError::MissingItem(uid.clone()))?;
    ctx.resolved.remove(uid);
    index_entity(uid, &entity, ctx)
}

fn walk(value: &Value, path: &Path, owner: Option<&Uid>, ctx: &mut FlushContext<'_>) -> GraphResult<Value> {
    if let Some(uid) = ctx.field().uid_of(value) {
        let resolved = parse_entity(&uid, value, ctx)?;
        match owner {
            Some(parent) => references::assign_refs(parent, &uid, path, ctx)?,
            None => {
                ctx.pinned.insert(uid);
            }
        }
        return Ok(resolved);
    }
    walk_children(value, path, owner, ctx)
}

fn walk_children(value: &Value, path: &Path, owner: Option<&Uid>, ctx: &mut FlushContext<'_>) -> GraphResult<Value> {
    match value {
        Value::Record(rec) => {
            let mut out: Option<Record> = None;
            for (key, child) in rec.iter() {
                let next = walk(child, &path.key(key.as_str()), owner, ctx)?;
                if !next.same(child) {
                    out.get_or_insert_with(|| (**rec).clone())
                        .insert(key.clone(), next);
                }
            }
            Ok(out.map(Value::from_record).unwrap_or_else(|| value.clone()))
        }
        Value::List(items) => {
            let mut out: Option<Vec<Value>> = None;
            for (i, child) in items.iter().enumerate() {
                let next = walk(child, &path.index(i), owner, ctx)?;
                if !next.same(child) {
                    out.get_or_insert_with(|| (**items).clone())[i] = next;
                }
            }
            Ok(out.map(Value::from_list).unwrap_or_else(|| value.clone()))
        }
        _ => Ok(value.clone()),
    }
}

fn parse_entity(uid: &Uid, value: &Value, ctx: &mut FlushContext<'_>) -> GraphResult<Value> {
    if ctx.walking.contains(uid) {
        warn!(%uid, "entity references itself");
        return Err(GraphError::CycleDetected { uid: uid.clone() });
    }

    // First come, first served: a uid resolves once per write.
    if ctx.resolved.contains(uid) {
        return ctx
            .view(uid)
            .map(|item| item.entity.clone())
            .ok_or_else(|| GraphError::MissingItem(uid.clone()));
    }

    if !ctx.is_evicted(uid) {
        if let Some(live) = ctx.live().item(uid) {
            if live.entity.same(value) {
                ctx.resolved.insert(uid.clone());
                return Ok(value.clone());
            }
            if !ctx.is_strong() {
                trace!(%uid, "weak write keeps stored entity");
                ctx.resolved.insert(uid.clone());
                return Ok(live.entity.clone());
            }
        }
    }

    index_entity(uid, value, ctx)
}

fn index_entity(uid: &Uid, value: &Value, ctx: &mut FlushContext<'_>) -> GraphResult<Value> {
    ctx.resolved.insert(uid.clone());
    ctx.stage(uid, value.clone())?;

    ctx.walking.push(uid.clone());
    let walked = walk_children(value, &Path::root(), Some(uid), ctx);
    ctx.walking.pop();
    let resolved = walked?;

    ctx.edit(uid)?.entity = resolved.clone();
    references::reconcile_outgoing(uid, ctx)?;
    trace!(%uid, "indexed entity");
    Ok(resolved)
}
