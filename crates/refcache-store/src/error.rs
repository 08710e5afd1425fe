//! Error types for version store operations.

use refcache_graph::GraphError;
use thiserror::Error;

/// Errors that can occur during version store operations.
///
/// Expected outcomes such as undoing past the first node or closing a thread
/// that is not open are reported through
/// [`OpResult::success`](crate::OpResult::success), not as errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The operation violates the store's usage contract (for example closing
    /// `main`, or reconfiguring a store that already holds history).
    #[error("illegal operation: {0}")]
    IllegalOperation(String),

    /// The thread id is malformed.
    #[error("invalid thread id {id:?}: {reason}")]
    InvalidThreadId { id: String, reason: String },

    /// The write was rejected by the reference graph.
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),
}

/// Convenience type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
