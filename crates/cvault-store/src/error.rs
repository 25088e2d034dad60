/// Errors from session storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The write would push the store past its quota.
    #[error("storage quota exceeded: {requested} units requested, quota is {quota}")]
    QuotaExceeded { requested: usize, quota: usize },

    /// The key cannot be used with this backend.
    #[error("invalid storage key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Storage is disabled or otherwise refuses writes.
    #[error("storage is read-only")]
    ReadOnly,
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
