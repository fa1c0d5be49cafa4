//! Versioned migration steps and the walks that run them.
//!
//! A [`MigrationStep`] pairs a [`Version`] with an optional apply action and
//! an optional revert action. Steps are grouped in a [`MigrationSet`] and run
//! by one of four walks:
//!
//! | Walk         | Order      | Action   | Version store                          |
//! |--------------|------------|----------|----------------------------------------|
//! | [`migrate`]  | ascending  | `apply`  | skips recorded versions, records runs  |
//! | [`rollback`] | descending | `revert` | skips pending versions, removes runs   |
//! | [`sow`]      | ascending  | `apply`  | none                                   |
//! | [`reap`]     | descending | `revert` | none                                   |
//!
//! Every walk takes a `limit`: only the first `limit` steps of the ordered
//! walk are considered, counting skipped steps. Zero means no limit.
//!
//! # Example
//!
//! ```rust
//! use furrow::migration::{migrate, rollback, MigrationSet, MigrationStep};
//! use furrow::store::memory::InMemoryVersionStore;
//! use furrow::store::VersionStore;
//!
//! let record = InMemoryVersionStore::new();
//! let store = VersionStore::new(record.clone());
//!
//! let steps = MigrationSet::new()
//!     .add_step(MigrationStep::new(1).with_apply(|| Ok(())).with_revert(|| Ok(())))
//!     .add_step(MigrationStep::new(2).with_apply(|| Ok(())).with_revert(|| Ok(())));
//!
//! migrate(Some(&store), &steps, 0).unwrap();
//! assert_eq!(record.applied_versions(), vec![1, 2]);
//!
//! rollback(Some(&store), &steps, 1).unwrap();
//! assert_eq!(record.applied_versions(), vec![1]);
//! ```
//!
//! # Failure
//!
//! A walk stops at the first failing step. Nothing is undone: steps that
//! completed before the failure stay applied and recorded, so a later run
//! resumes where this one stopped.

mod manager;
mod migration;
mod set;

pub use manager::{migrate, reap, rollback, sow, Direction};
pub use migration::{MigrationStep, Operation, Version};
pub use set::{limited_prefix, MigrationSet};
