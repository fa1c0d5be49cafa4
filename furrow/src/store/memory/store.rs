use crate::errors::{ErrorKind, FurrowError, FurrowResult};
use crate::migration::Version;
use crate::store::VersionStoreProvider;
use crossbeam_skiplist::SkipSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// In-memory implementation of a version store.
///
/// # Purpose
/// `InMemoryVersionStore` keeps the applied-version record in a concurrent
/// skip set. It is meant for tests and for one-shot runs where the record
/// does not need to outlive the process.
///
/// # Characteristics
/// - **Thread-Safe**: clones share the same record
/// - **Ordered**: `applied_versions()` lists versions in ascending order
/// - **Lifecycle-checked**: record operations fail with
///   `StoreNotInitialized` outside a `setup`/`teardown` window
/// - **No Persistence**: the record is lost when the last clone is dropped
///
/// # Usage
/// ```text
/// let store = InMemoryVersionStore::with_versions([1, 2]);
/// store.setup()?;
/// assert!(!store.is_pending(1)?);
/// store.teardown()?;
/// ```
#[derive(Clone, Default)]
pub struct InMemoryVersionStore {
    inner: Arc<InMemoryVersionStoreInner>,
}

impl InMemoryVersionStore {
    /// Creates an empty store.
    pub fn new() -> InMemoryVersionStore {
        InMemoryVersionStore {
            inner: Arc::new(InMemoryVersionStoreInner::default()),
        }
    }

    /// Creates a store whose record already contains `versions`.
    pub fn with_versions(versions: impl IntoIterator<Item = Version>) -> InMemoryVersionStore {
        let store = InMemoryVersionStore::new();
        for version in versions {
            store.inner.versions.insert(version);
        }
        store
    }

    /// Returns the recorded versions in ascending order.
    ///
    /// Unlike the record operations this is readable at any time, so tests
    /// can inspect the record after a run has torn the store down.
    pub fn applied_versions(&self) -> Vec<Version> {
        self.inner
            .versions
            .iter()
            .map(|entry| *entry.value())
            .collect()
    }

    /// Returns `true` between a successful `setup` and the next `teardown`.
    pub fn is_open(&self) -> bool {
        self.inner.open.load(Ordering::Relaxed)
    }
}

impl VersionStoreProvider for InMemoryVersionStore {
    fn setup(&self) -> FurrowResult<()> {
        self.inner.setup()
    }

    fn is_pending(&self, version: Version) -> FurrowResult<bool> {
        self.inner.is_pending(version)
    }

    fn record_applied(&self, version: Version) -> FurrowResult<()> {
        self.inner.record_applied(version)
    }

    fn record_reverted(&self, version: Version) -> FurrowResult<()> {
        self.inner.record_reverted(version)
    }

    fn teardown(&self) -> FurrowResult<()> {
        self.inner.teardown()
    }
}

#[derive(Default)]
struct InMemoryVersionStoreInner {
    versions: SkipSet<Version>,
    open: AtomicBool,
}

impl InMemoryVersionStoreInner {
    fn setup(&self) -> FurrowResult<()> {
        if !self.open.swap(true, Ordering::Relaxed) {
            log::debug!(
                "Opened in-memory version store with {} recorded versions",
                self.versions.len()
            );
        }
        Ok(())
    }

    #[inline]
    fn check_opened(&self) -> FurrowResult<()> {
        if self.open.load(Ordering::Relaxed) {
            Ok(())
        } else {
            Err(FurrowError::new(
                "In-memory version store is not set up",
                ErrorKind::StoreNotInitialized,
            ))
        }
    }

    fn is_pending(&self, version: Version) -> FurrowResult<bool> {
        self.check_opened()?;
        Ok(!self.versions.contains(&version))
    }

    fn record_applied(&self, version: Version) -> FurrowResult<()> {
        self.check_opened()?;
        self.versions.insert(version);
        Ok(())
    }

    fn record_reverted(&self, version: Version) -> FurrowResult<()> {
        self.check_opened()?;
        self.versions.remove(&version);
        Ok(())
    }

    fn teardown(&self) -> FurrowResult<()> {
        self.open.store(false, Ordering::Relaxed);
        Ok(())
    }
}
