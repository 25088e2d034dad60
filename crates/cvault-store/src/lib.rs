//! Session-scoped key/value storage for cvault.
//!
//! The version history persists a single string value under a single key,
//! the way a browser page uses `sessionStorage`. This crate abstracts that
//! surface so the history can run against memory, a session directory, or
//! anything else that can hold strings.
//!
//! # Storage Backends
//!
//! All backends implement the [`SessionStorage`] trait:
//!
//! - [`InMemorySessionStorage`] -- `HashMap`-based store with an optional
//!   browser-style quota, for tests and embedding
//! - [`FileSessionStorage`] -- one file per key inside a session directory
//!
//! # Design Rules
//!
//! 1. A write either replaces the whole value or leaves the old one intact.
//! 2. Reading a missing key is `Ok(None)`, not an error.
//! 3. Removing a missing key is a no-op.
//! 4. The store never interprets values.

pub mod error;
pub mod file;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use file::FileSessionStorage;
pub use memory::InMemorySessionStorage;
pub use traits::SessionStorage;
