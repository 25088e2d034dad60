/// Errors from obfuscation and de-obfuscation.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The obfuscation key is empty or has characters above U+00FF.
    #[error("invalid obfuscation key: {0}")]
    InvalidKey(String),

    /// Input text has a UTF-16 unit that does not fit in one byte.
    #[error("character {ch:?} at position {position} is outside the single-byte range")]
    UnrepresentableChar { ch: char, position: usize },

    /// The stored value is not valid base64.
    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// JSON serialization or parsing failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;
