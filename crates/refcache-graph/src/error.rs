//! Error types for graph operations.

use refcache_types::Uid;

/// Errors that can occur while building or reconciling a flush.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GraphError {
    /// Writing the value would make an entity (transitively) reference itself.
    #[error("cyclic reference through entity {uid}")]
    CycleDetected {
        /// An entity on the cycle.
        uid: Uid,
    },

    /// The value was expected to be an entity (or a list of entities).
    #[error("not an entity: {0}")]
    NotAnEntity(String),

    /// Bookkeeping references an entity that is in neither the flush nor the
    /// live snapshot.
    #[error("missing cache item: {0}")]
    MissingItem(Uid),
}

/// Convenience alias for graph results.
pub type GraphResult<T> = Result<T, GraphError>;
