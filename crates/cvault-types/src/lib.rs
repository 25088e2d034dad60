//! Foundation types for cvault, the CV version store.
//!
//! Every other cvault crate depends on `cvault-types`.
//!
//! # Key Types
//!
//! - [`VersionId`] — Millisecond creation timestamp doubling as a sortable identifier
//! - [`CvVersion`] — One saved CV snapshot: id, timestamp, opaque content, metadata
//! - [`VersionMetadata`] — Style, job target, section list, and caller extras
//! - [`Clock`] — Time source; [`SystemClock`] for production, [`ManualClock`] for tests

pub mod error;
pub mod temporal;
pub mod version;

pub use error::TypeError;
pub use temporal::{relative_age, to_iso_millis, Clock, ManualClock, SystemClock};
pub use version::{CvVersion, JobId, VersionId, VersionMetadata, DEFAULT_STYLE};
