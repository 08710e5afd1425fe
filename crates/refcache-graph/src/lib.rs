//! Reference-graph index for refcache.
//!
//! Every stored entity is a [`CacheItem`] that knows, per related entity, the
//! paths at which it references that entity (`map_to`) and the paths at which
//! it is referenced (`map_from`). A write is staged in a [`FlushContext`]
//! against the live [`Snapshot`] and committed as exactly one new snapshot.
//!
//! # Write pipeline
//!
//! 1. [`parser`] discovers entities in the input and stages them, recording
//!    edges as it goes. The [`evictor`] plays this role for removals.
//! 2. [`references`] drops edges whose path no longer leads to the recorded
//!    child, collects entities left without referrers, and propagates new
//!    entity versions to every ancestor.
//! 3. [`flusher`] merges the staged items over the live snapshot.
//!
//! # Invariants
//!
//! - `p in B.map_from[a]` iff `p in A.map_to[b]` within one snapshot.
//! - Committed items and snapshots are never mutated.
//! - The entity graph is acyclic; writes that would close a cycle fail.

pub mod clone;
pub mod context;
pub mod error;
pub mod evictor;
pub mod flusher;
pub mod item;
pub mod parser;
pub mod references;
pub mod snapshot;
pub mod version_map;

pub use clone::{editable_copy, replace_entity};
pub use context::FlushContext;
pub use error::{GraphError, GraphResult};
pub use flusher::{commit, evict, put};
pub use item::{CacheItem, RefMap};
pub use snapshot::Snapshot;
pub use version_map::VersionMap;
