//! # Furrow - Versioned Migration Orchestration
//!
//! Furrow applies and reverts ordered, versioned units of work ("migration
//! steps") exactly once, using a pluggable version store to remember which
//! versions have been applied.
//!
//! ## Key Features
//!
//! - **Ordered walks**: forward in ascending version order, reverse in descending order
//! - **Exactly once**: recorded versions are skipped by `migrate`, pending ones by `rollback`
//! - **Bounded runs**: a step limit caps how much of a walk is considered
//! - **Guaranteed teardown**: a store that was set up is always torn down
//! - **Pluggable stores**: in-memory here, persistent in `furrow-fjall-adapter`
//!
//! ## Quick Start
//!
//! ```rust
//! use furrow::migration::{MigrationSet, MigrationStep};
//! use furrow::migrator::Migrator;
//! use furrow::store::memory::InMemoryVersionStore;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let steps = MigrationSet::new()
//!     .add_step(
//!         MigrationStep::new(1)
//!             .with_apply(|| Ok(()))
//!             .with_revert(|| Ok(())),
//!     )
//!     .add_step(MigrationStep::new(2).with_apply(|| Ok(())));
//!
//! let migrator = Migrator::builder()
//!     .version_store(InMemoryVersionStore::new())
//!     .build();
//!
//! migrator.migrate(&steps)?;
//! migrator.rollback(&steps)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`common`] - Constants and shared utilities
//! - [`errors`] - Error types and result definitions
//! - [`migration`] - Steps, step sets and the migrate/rollback/sow/reap walks
//! - [`migrator`] - Configured entry point built with [`migrator::Migrator::builder`]
//! - [`store`] - Version store contract and the in-memory store

use std::thread::available_parallelism;

pub mod common;
pub mod errors;
pub mod migration;
pub mod migrator;
pub mod store;

/// Returns the number of available CPU cores, or 1 if detection fails.
///
/// Store backends use it to size their background worker pools.
///
/// ```rust
/// assert!(furrow::get_cpu_count() > 0);
/// ```
pub fn get_cpu_count() -> usize {
    available_parallelism()
        .map(|p| p.get())
        .unwrap_or_else(|err| {
            log::warn!("Failed to detect available parallelism: {}. Defaulting to single thread.", err);
            1
        })
}
