use cvault_codec::CodecError;
use cvault_store::StoreError;

/// Errors from history operations.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    /// The CV content could not be turned into JSON.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Obfuscating or revealing the persisted value failed.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// The storage backend failed.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// The configuration is malformed or invalid.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Reading a configuration file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for history operations.
pub type HistoryResult<T> = Result<T, HistoryError>;

/// Errors raised by artifact sinks.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The artifact name cannot be used as a file name.
    #[error("invalid artifact name {0:?}")]
    InvalidName(String),

    /// Writing the artifact failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
