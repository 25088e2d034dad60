//! Bounded CV version history for cvault.
//!
//! [`CvHistory`] keeps the last few generated CVs, newest first, as a single
//! obfuscated value in a [`SessionStorage`](cvault_store::SessionStorage)
//! backend. It behaves like an undo stack capped at
//! [`MAX_VERSIONS`] entries: saving past capacity evicts the oldest entry.
//!
//! # Failure policy
//!
//! The public operations never return errors. A failed save yields `None`,
//! a failed delete or export yields `false`, and a persisted value that
//! cannot be decoded reads as an empty history. Failures are logged through
//! `tracing`. Callers that need the underlying error use the `try_*`
//! variants.
//!
//! # Exports
//!
//! A version is exported as `cv_{style}_{id}.json` through an
//! [`ArtifactSink`]: [`DirectorySink`] writes files, [`MemorySink`] keeps
//! them in memory.

pub mod config;
pub mod error;
pub mod export;
pub mod history;
pub mod summary;

pub use config::{HistoryConfig, DEFAULT_STORAGE_KEY, MAX_VERSIONS};
pub use error::{ExportError, HistoryError, HistoryResult};
pub use export::{Artifact, ArtifactSink, DirectorySink, MemorySink};
pub use history::CvHistory;
pub use summary::{StorageStats, VersionSummary, DEFAULT_JOB_TITLE};

pub use cvault_types::{CvVersion, JobId, VersionId, VersionMetadata};
