//! Obfuscation codec for cvault.
//!
//! The persisted version list is written as
//! `base64(xor(json, key))` where the XOR runs over UTF-16 code units
//! against a cyclically repeated key. The format matches what browsers
//! produce with `btoa`/`atob`, so blobs written by either side decode on the
//! other.
//!
//! This is obfuscation, not encryption. The key is a static literal compiled
//! into every build and shared by every session and user; anyone holding the
//! binary or the source recovers the plaintext. It only keeps CV text out of
//! casual view in a storage inspector.

pub mod error;
pub mod obfuscator;

pub use error::{CodecError, CodecResult};
pub use obfuscator::{escape_non_latin1, Obfuscator, DEFAULT_OBFUSCATION_KEY};
