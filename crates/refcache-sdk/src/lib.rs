//! High-level API for refcache.
//!
//! [`Cache`] is the entry point for applications: it owns one versioned cache
//! instance, applies its [`CacheConfig`], and serializes access so it can be
//! shared across threads. [`CacheRegistry`] keeps named caches for hosts that
//! need more than one.

pub mod cache;
pub mod config;
pub mod error;
pub mod registry;

pub use cache::Cache;
pub use config::CacheConfig;
pub use error::{SdkError, SdkResult};
pub use registry::CacheRegistry;

// Re-export key types
pub use refcache_store::{NodeId, OpResult, ThreadId, ThreadState};
pub use refcache_types::{Path, Uid, UidField, Value};
