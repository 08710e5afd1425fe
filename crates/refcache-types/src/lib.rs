//! Foundation types for refcache.
//!
//! This crate provides the value model that the cache stores, the uid
//! capability check that decides which values are shareable entities, and the
//! path type used to address locations inside an entity. Every other refcache
//! crate depends on `refcache-types`.
//!
//! # Key Types
//!
//! - [`Value`]: Tagged-variant value tree (record / list / scalar / date)
//! - [`Uid`]: Unique identifier of a referenceable entity
//! - [`UidField`]: The configured uid property and the capability check
//! - [`Path`]: Sequence of key/index steps inside an entity
//!
//! The [`path`] module doubles as the path accessor: [`path::get`] reads the
//! value at a path and [`path::delete`] produces a copy with it removed.

pub mod error;
pub mod path;
pub mod uid;
pub mod value;

pub use error::TypeError;
pub use path::{Path, PathStep};
pub use uid::{Uid, UidField};
pub use value::{Record, Value};
