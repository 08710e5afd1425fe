use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("lock poisoned: {0}")]
    LockPoisoned(String),

    #[error("store error: {0}")]
    Store(#[from] refcache_store::StoreError),

    #[error("graph error: {0}")]
    Graph(#[from] refcache_graph::GraphError),

    #[error("type error: {0}")]
    Type(#[from] refcache_types::TypeError),
}

impl SdkError {
    /// Whether this error reports a violated usage contract rather than bad
    /// input data.
    pub fn is_illegal_operation(&self) -> bool {
        matches!(self, SdkError::Store(refcache_store::StoreError::IllegalOperation(_)))
    }
}

pub type SdkResult<T> = Result<T, SdkError>;
