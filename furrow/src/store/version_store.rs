use crate::errors::FurrowResult;
use crate::migration::Version;
use std::ops::Deref;
use std::sync::Arc;

/// Capability contract every version store backend must satisfy.
///
/// # Purpose
/// A version store persists the set of versions whose apply action has run
/// and has not been reverted since. The orchestrator consults it to decide
/// which steps to skip and updates it after every successful action.
///
/// # Lifecycle
/// - `setup` is called once at the start of every orchestration run and must
///   be idempotent: it prepares the record storage if it does not exist yet
/// - `teardown` is called once at the end of every run whose `setup`
///   succeeded, including runs that stopped on an error
///
/// # Ownership
/// A backend that opened its own resource in `setup` releases it in
/// `teardown`. A backend wrapping a resource managed by the caller must leave
/// it open and make `teardown` a no-op.
///
/// # Implementations
/// - `InMemoryVersionStore`: process-local record for tests and one-shot runs
/// - `FjallVersionStore`: persistent record in the `furrow-fjall-adapter` crate
///
/// # Thread Safety
/// Implementers must be `Send + Sync`. The orchestrator never calls a store
/// concurrently; only one orchestration run may use a store at a time.
pub trait VersionStoreProvider: Send + Sync {
    /// Prepares the store for a run. Must be safe to call on every run.
    fn setup(&self) -> FurrowResult<()>;

    /// Returns `true` when `version` is NOT recorded as applied (it is still
    /// pending forward application) and `false` when it is recorded.
    fn is_pending(&self, version: Version) -> FurrowResult<bool>;

    /// Durably adds `version` to the record. Recording a version that is
    /// already present is not an error.
    fn record_applied(&self, version: Version) -> FurrowResult<()>;

    /// Durably removes `version` from the record.
    fn record_reverted(&self, version: Version) -> FurrowResult<()>;

    /// Releases whatever `setup` acquired, when the store owns it.
    fn teardown(&self) -> FurrowResult<()>;
}

/// Shared handle to a [`VersionStoreProvider`].
///
/// # Characteristics
/// - **Type-erased**: holds any backend behind `Arc<dyn VersionStoreProvider>`
/// - **Cheap to clone**: clones share the same backend
/// - **Ergonomic**: dereferences to the provider so its methods are called directly
///
/// # Usage
/// ```rust
/// use furrow::store::memory::InMemoryVersionStore;
/// use furrow::store::VersionStore;
///
/// let store = VersionStore::new(InMemoryVersionStore::new());
/// store.setup().unwrap();
/// assert!(store.is_pending(1).unwrap());
/// store.teardown().unwrap();
/// ```
#[derive(Clone)]
pub struct VersionStore {
    inner: Arc<dyn VersionStoreProvider>,
}

impl VersionStore {
    pub fn new<T: VersionStoreProvider + 'static>(inner: T) -> Self {
        VersionStore {
            inner: Arc::new(inner),
        }
    }
}

impl Deref for VersionStore {
    type Target = Arc<dyn VersionStoreProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<T: VersionStoreProvider + 'static> From<T> for VersionStore {
    fn from(inner: T) -> Self {
        VersionStore::new(inner)
    }
}
