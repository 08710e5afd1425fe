//! The write pipelines and the commit step that turns a reconciled flush into
//! the next snapshot.

use refcache_types::{Uid, UidField, Value};
use tracing::debug;

use crate::context::FlushContext;
use crate::error::{GraphError, GraphResult};
use crate::evictor;
use crate::parser;
use crate::references;
use crate::snapshot::Snapshot;

/// Merge a reconciled context over its live snapshot.
///
/// Returns `None` when the context holds no change, so the caller records no
/// new version.
pub fn commit(ctx: FlushContext<'_>) -> Option<Snapshot> {
    if !ctx.has_changes() {
        return None;
    }
    let mut next = ctx.live().clone();
    let (flush, evict) = ctx.into_maps();
    let (written, removed) = (flush.len(), evict.len());
    for (_, item) in flush.into_entries() {
        next.insert(item);
    }
    for uid in evict.keys() {
        next.remove(uid);
    }
    debug!(written, removed, entities = next.len(), "flushed snapshot");
    Some(next)
}

/// Write `value` over `live`.
///
/// `value` must be a record or a list; scalars are rejected. `strong = false`
/// keeps entities already present in `live` as they are.
pub fn put(live: &Snapshot, field: &UidField, value: &Value, strong: bool) -> GraphResult<Option<Snapshot>> {
    if !matches!(value, Value::Record(_) | Value::List(_)) {
        return Err(GraphError::NotAnEntity(value.to_string()));
    }
    let mut ctx = FlushContext::new(live, field).with_strong(strong);
    parser::parse(value, &mut ctx)?;
    references::collect_orphans(&mut ctx)?;
    references::check_acyclic(&ctx)?;
    references::propagate_dirty(&mut ctx)?;
    Ok(commit(ctx))
}

/// Remove `uids` from `live`.
pub fn evict(live: &Snapshot, field: &UidField, uids: &[Uid]) -> GraphResult<Option<Snapshot>> {
    let mut ctx = FlushContext::new(live, field);
    if !evictor::evict(uids, &mut ctx)? {
        return Ok(None);
    }
    Ok(commit(ctx))
}
