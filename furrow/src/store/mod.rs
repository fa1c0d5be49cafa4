//! Version store abstraction and the bundled in-memory backend.
//!
//! The orchestrator never talks to a database directly. It asks a
//! [`VersionStore`] whether a version is still pending and tells it when a
//! version has been applied or reverted. Backends implement
//! [`VersionStoreProvider`]:
//!
//! - **In-Memory Store**: [`memory::InMemoryVersionStore`] for tests and one-shot runs
//! - **Fjall Store**: `furrow-fjall-adapter` for a persistent, LSM-based record
//!
//! # Persisted Shape
//!
//! A backend only needs one collection of version identifiers, keyed by the
//! version itself. No other columns are read or written.

pub mod memory;
mod version_store;

pub use version_store::*;
