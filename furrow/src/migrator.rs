use crate::common::UNBOUNDED;
use crate::errors::FurrowResult;
use crate::migration::{self, MigrationSet};
use crate::store::VersionStore;
use std::sync::Arc;

/// A configured entry point for running migration walks.
///
/// `Migrator` binds an optional [`VersionStore`] and a step limit so callers
/// do not have to pass them on every run. It delegates to the free functions
/// in [`crate::migration`].
///
/// Cloning a `Migrator` is cheap; all clones share the same configuration
/// through `Arc<MigratorInner>`.
///
/// # Examples
///
/// ```rust
/// use furrow::migration::{MigrationSet, MigrationStep};
/// use furrow::migrator::Migrator;
/// use furrow::store::memory::InMemoryVersionStore;
///
/// let record = InMemoryVersionStore::new();
/// let migrator = Migrator::builder()
///     .version_store(record.clone())
///     .limit(2)
///     .build();
///
/// let steps: MigrationSet = (1..=3)
///     .map(|v| MigrationStep::new(v).with_apply(|| Ok(())))
///     .collect();
/// migrator.migrate(&steps).unwrap();
///
/// // the limit bounds the walk, not the number of pending steps
/// migrator.migrate(&steps).unwrap();
/// assert_eq!(record.applied_versions(), vec![1, 2]);
/// ```
#[derive(Clone)]
pub struct Migrator {
    inner: Arc<MigratorInner>,
}

impl Migrator {
    /// Returns a builder with no version store and no limit.
    pub fn builder() -> MigratorBuilder {
        MigratorBuilder::new()
    }

    /// Applies pending steps in ascending order. See [`migration::migrate`].
    pub fn migrate(&self, steps: &MigrationSet) -> FurrowResult<()> {
        migration::migrate(self.inner.version_store.as_ref(), steps, self.inner.limit)
    }

    /// Reverts recorded steps in descending order. See [`migration::rollback`].
    pub fn rollback(&self, steps: &MigrationSet) -> FurrowResult<()> {
        migration::rollback(self.inner.version_store.as_ref(), steps, self.inner.limit)
    }

    /// Runs every apply action, ignoring the version store.
    pub fn sow(&self, steps: &MigrationSet) -> FurrowResult<()> {
        migration::sow(steps, self.inner.limit)
    }

    /// Runs every revert action, ignoring the version store.
    pub fn reap(&self, steps: &MigrationSet) -> FurrowResult<()> {
        migration::reap(steps, self.inner.limit)
    }

    pub fn limit(&self) -> usize {
        self.inner.limit
    }

    pub fn version_store(&self) -> Option<&VersionStore> {
        self.inner.version_store.as_ref()
    }
}

struct MigratorInner {
    version_store: Option<VersionStore>,
    limit: usize,
}

/// Builder for [`Migrator`].
///
/// A limit of [`UNBOUNDED`] (zero) runs every step of a walk.
#[derive(Clone)]
pub struct MigratorBuilder {
    version_store: Option<VersionStore>,
    limit: usize,
}

impl Default for MigratorBuilder {
    fn default() -> Self {
        MigratorBuilder::new()
    }
}

impl MigratorBuilder {
    pub fn new() -> Self {
        MigratorBuilder {
            version_store: None,
            limit: UNBOUNDED,
        }
    }

    /// Sets the store used by `migrate` and `rollback`.
    pub fn version_store(mut self, store: impl Into<VersionStore>) -> Self {
        self.version_store = Some(store.into());
        self
    }

    /// Caps how many leading steps of a walk are considered.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn build(self) -> Migrator {
        log::debug!(
            "Building migrator with {} version store and limit {}",
            if self.version_store.is_some() { "a" } else { "no" },
            self.limit
        );
        Migrator {
            inner: Arc::new(MigratorInner {
                version_store: self.version_store,
                limit: self.limit,
            }),
        }
    }
}
