//! Versioned history for refcache.
//!
//! Each committed write becomes a [`CacheNode`] in the [`CacheRepo`], holding
//! one immutable snapshot. Threads are named, independently steppable lists
//! of node ids sharing that storage; a node lives as long as at least one
//! thread holds it.
//!
//! # Modules
//!
//! - [`error`]: error types for store operations
//! - [`names`]: [`ThreadId`] and its validation
//! - [`node`]: [`NodeId`] and [`CacheNode`]
//! - [`repo`]: the owner-counted node repository
//! - [`thread`]: [`CacheThread`] cursor and reshaping
//! - [`stats`]: [`OpResult`] and [`ThreadState`]
//! - [`instance`]: [`CacheInstance`], the write protocol and thread operations

pub mod error;
pub mod instance;
pub mod names;
pub mod node;
pub mod repo;
pub mod stats;
pub mod thread;

pub use error::{StoreError, StoreResult};
pub use instance::CacheInstance;
pub use names::{validate_thread_id, ThreadId};
pub use node::{CacheNode, NodeId};
pub use repo::CacheRepo;
pub use stats::{OpResult, ThreadState};
pub use thread::CacheThread;
