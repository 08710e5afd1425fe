//! Structural copies of entity values.
//!
//! Both functions stop at nested entities: a record carrying a uid is kept by
//! reference unless it is the one being replaced. Embedded records and lists
//! are walked.

use std::sync::Arc;

use refcache_types::{Uid, UidField, Value};

/// A copy of `entity` in which every nested occurrence of entity `target` is
/// replaced by `replacement`.
///
/// The root itself is never replaced, only its contents. Branches that do not
/// contain `target` stay shared with `entity`; if nothing matches, the result
/// is identical to `entity`.
pub fn replace_entity(entity: &Value, field: &UidField, target: &Uid, replacement: &Value) -> Value {
    replace_children(entity, field, target, replacement).unwrap_or_else(|| entity.clone())
}

fn replace_value(value: &Value, field: &UidField, target: &Uid, replacement: &Value) -> Option<Value> {
    match field.uid_of(value) {
        Some(uid) if &uid == target => {
            if value.same(replacement) {
                None
            } else {
                Some(replacement.clone())
            }
        }
        Some(_) => None,
        None => replace_children(value, field, target, replacement),
    }
}

fn replace_children(value: &Value, field: &UidField, target: &Uid, replacement: &Value) -> Option<Value> {
    match value {
        Value::Record(rec) => {
            let mut out: Option<refcache_types::Record> = None;
            for (key, child) in rec.iter() {
                if let Some(next) = replace_value(child, field, target, replacement) {
                    out.get_or_insert_with(|| (**rec).clone())
                        .insert(key.clone(), next);
                }
            }
            out.map(Value::from_record)
        }
        Value::List(items) => {
            let mut out: Option<Vec<Value>> = None;
            for (i, child) in items.iter().enumerate() {
                if let Some(next) = replace_value(child, field, target, replacement) {
                    out.get_or_insert_with(|| (**items).clone())[i] = next;
                }
            }
            out.map(Value::from_list)
        }
        _ => None,
    }
}

/// An editable copy of `entity`.
///
/// The root record and every embedded record or list are fresh, uniquely
/// owned allocations, so [`Value::record_mut`] edits them in place without
/// touching the cache. Nested entities stay shared with the cache.
pub fn editable_copy(entity: &Value, field: &UidField) -> Value {
    match entity {
        Value::Record(rec) => Value::Record(Arc::new(
            rec.iter()
                .map(|(k, v)| (k.clone(), editable_child(v, field)))
                .collect(),
        )),
        Value::List(items) => {
            Value::from_list(items.iter().map(|v| editable_child(v, field)).collect())
        }
        other => other.clone(),
    }
}

fn editable_child(value: &Value, field: &UidField) -> Value {
    if field.is_entity(value) {
        value.clone()
    } else {
        editable_copy(value, field)
    }
}
