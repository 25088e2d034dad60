use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid version id: {0}")]
    InvalidVersionId(String),

    #[error("timestamp out of range: {0}ms")]
    TimestampOutOfRange(u64),
}
