use crate::builder::FjallVersionStoreBuilder;
use crate::config::FjallVersionStoreConfig;
use crate::wrapper::{decode_version, encode_version, to_furrow_error};
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use furrow::common::{atomic, Atomic, ReadExecutor, WriteExecutor};
use furrow::errors::{ErrorKind, FurrowError, FurrowResult};
use furrow::migration::Version;
use furrow::store::VersionStoreProvider;
use std::sync::Arc;

/// Persistent version store backed by a fjall keyspace.
///
/// Applied versions are kept as keys of a single partition (default
/// `data_migrations`). Keys use an order-preserving encoding so the record
/// reads back in ascending version order; values are empty.
///
/// A store either owns its keyspace or borrows one:
/// - [`FjallVersionStore::with_config()`] builds an owning store. `setup`
///   opens the keyspace at the configured path and `teardown` persists and
///   releases it.
/// - [`FjallVersionStore::from_keyspace()`] wraps a keyspace managed by the
///   caller. `setup` only opens the partition and `teardown` leaves
///   everything open.
///
/// Every record write is persisted with `PersistMode::SyncAll` unless the
/// owning configuration asks for manual journal persistence.
///
/// Uses PIMPL with `Arc<FjallVersionStoreInner>`; clones share the same
/// keyspace and partition handles.
#[derive(Clone)]
pub struct FjallVersionStore {
    inner: Arc<FjallVersionStoreInner>,
}

impl FjallVersionStore {
    /// Returns a builder for an owning store.
    ///
    /// ```rust,ignore
    /// let store = FjallVersionStore::with_config()
    ///     .db_path("/var/lib/app/migrations")
    ///     .build();
    /// ```
    #[inline]
    pub fn with_config() -> FjallVersionStoreBuilder {
        FjallVersionStoreBuilder::new()
    }

    pub(crate) fn new(config: FjallVersionStoreConfig) -> FjallVersionStore {
        let partition_name = config.partition_name();
        FjallVersionStore {
            inner: Arc::new(FjallVersionStoreInner::new(
                KeyspaceSource::Owned(config),
                partition_name,
            )),
        }
    }

    /// Wraps a keyspace the caller opened and keeps managing.
    pub fn from_keyspace(keyspace: Keyspace, partition_name: &str) -> FjallVersionStore {
        FjallVersionStore {
            inner: Arc::new(FjallVersionStoreInner::new(
                KeyspaceSource::Borrowed(keyspace),
                partition_name.to_string(),
            )),
        }
    }

    /// Returns `true` when `teardown` releases the keyspace.
    #[inline]
    pub fn owns_keyspace(&self) -> bool {
        matches!(self.inner.source, KeyspaceSource::Owned(_))
    }

    #[inline]
    pub fn partition_name(&self) -> &str {
        &self.inner.partition_name
    }

    /// The configuration of an owning store, `None` for a borrowed keyspace.
    pub fn config(&self) -> Option<&FjallVersionStoreConfig> {
        match &self.inner.source {
            KeyspaceSource::Owned(config) => Some(config),
            KeyspaceSource::Borrowed(_) => None,
        }
    }

    /// Returns `true` between `setup` and the releasing `teardown`.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.inner.partition.read_with(|it| it.is_some())
    }

    /// Lists the recorded versions in ascending order.
    ///
    /// A closed store is opened for the read and closed again afterwards.
    pub fn applied_versions(&self) -> FurrowResult<Vec<Version>> {
        if self.is_open() {
            return self.inner.read_versions();
        }

        self.inner.setup()?;
        let versions = self.inner.read_versions();
        let released = self.inner.teardown();
        let versions = versions?;
        released?;
        Ok(versions)
    }
}

impl VersionStoreProvider for FjallVersionStore {
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

enum KeyspaceSource {
    Owned(FjallVersionStoreConfig),
    Borrowed(Keyspace),
}

struct FjallVersionStoreInner {
    source: KeyspaceSource,
    partition_name: String,
    keyspace: Atomic<Option<Keyspace>>,
    partition: Atomic<Option<PartitionHandle>>,
}

impl FjallVersionStoreInner {
    fn new(source: KeyspaceSource, partition_name: String) -> FjallVersionStoreInner {
        FjallVersionStoreInner {
            source,
            partition_name,
            keyspace: atomic(None),
            partition: atomic(None),
        }
    }

    fn setup(&self) -> FurrowResult<()> {
        if self.partition.read_with(|it| it.is_some()) {
            return Ok(());
        }

        let keyspace = self.open_keyspace()?;
        let partition = keyspace
            .open_partition(&self.partition_name, self.partition_options())
            .map_err(|err| {
                log::error!("Failed to open partition {}: {}", self.partition_name, err);
                to_furrow_error(err)
            })?;

        self.keyspace.write_with(|it| *it = Some(keyspace));
        self.partition.write_with(|it| *it = Some(partition));
        log::debug!("Opened fjall version record {}", self.partition_name);
        Ok(())
    }

    fn open_keyspace(&self) -> FurrowResult<Keyspace> {
        match &self.source {
            KeyspaceSource::Borrowed(keyspace) => Ok(keyspace.clone()),
            KeyspaceSource::Owned(config) => {
                if config.db_path().is_empty() {
                    log::error!("Fjall version store has no db path");
                    return Err(FurrowError::new(
                        "Fjall version store has no db path",
                        ErrorKind::ValidationError,
                    ));
                }
                Keyspace::open(config.keyspace_config()).map_err(|err| {
                    log::error!("Failed to open keyspace at {}: {}", config.db_path(), err);
                    to_furrow_error(err)
                })
            }
        }
    }

    fn partition_options(&self) -> PartitionCreateOptions {
        match &self.source {
            KeyspaceSource::Owned(config) => config.partition_config(),
            KeyspaceSource::Borrowed(_) => PartitionCreateOptions::default(),
        }
    }

    #[inline]
    fn partition(&self) -> FurrowResult<PartitionHandle> {
        self.partition.read_with(|it| it.clone()).ok_or_else(|| {
            FurrowError::new(
                "Fjall version store is not set up",
                ErrorKind::StoreNotInitialized,
            )
        })
    }

    fn is_pending(&self, version: Version) -> FurrowResult<bool> {
        let partition = self.partition()?;
        let recorded = partition
            .contains_key(encode_version(version))
            .map_err(to_furrow_error)?;
        Ok(!recorded)
    }

    fn record_applied(&self, version: Version) -> FurrowResult<()> {
        let partition = self.partition()?;
        partition
            .insert(encode_version(version).to_vec(), Vec::<u8>::new())
            .map_err(to_furrow_error)?;
        self.persist()
    }

    fn record_reverted(&self, version: Version) -> FurrowResult<()> {
        let partition = self.partition()?;
        partition
            .remove(encode_version(version).to_vec())
            .map_err(to_furrow_error)?;
        self.persist()
    }

    fn read_versions(&self) -> FurrowResult<Vec<Version>> {
        let partition = self.partition()?;
        partition
            .iter()
            .map(|entry| -> FurrowResult<Version> {
                let (key, _) = entry.map_err(to_furrow_error)?;
                Ok(decode_version(&key)?)
            })
            .collect()
    }

    fn manual_journal_persist(&self) -> bool {
        match &self.source {
            KeyspaceSource::Owned(config) => config.manual_journal_persist(),
            KeyspaceSource::Borrowed(_) => false,
        }
    }

    fn persist(&self) -> FurrowResult<()> {
        if self.manual_journal_persist() {
            return Ok(());
        }

        match self.keyspace.read_with(|it| it.clone()) {
            Some(keyspace) => keyspace.persist(PersistMode::SyncAll).map_err(|err| {
                log::error!("Failed to persist version record: {}", err);
                to_furrow_error(err)
            }),
            None => Err(FurrowError::new(
                "Fjall version store is not set up",
                ErrorKind::StoreNotInitialized,
            )),
        }
    }

    fn teardown(&self) -> FurrowResult<()> {
        if let KeyspaceSource::Borrowed(_) = self.source {
            log::debug!("Leaving borrowed keyspace open for {}", self.partition_name);
            return Ok(());
        }

        let partition = self.partition.write_with(|it| it.take());
        let keyspace = self.keyspace.write_with(|it| it.take());
        drop(partition);

        if let Some(keyspace) = keyspace {
            keyspace.persist(PersistMode::SyncAll).map_err(|err| {
                log::error!("Failed to persist keyspace on teardown: {}", err);
                to_furrow_error(err)
            })?;
            log::debug!("Closed fjall version record {}", self.partition_name);
        }
        Ok(())
    }
}

impl Drop for FjallVersionStoreInner {
    fn drop(&mut self) {
        if let KeyspaceSource::Borrowed(_) = self.source {
            return;
        }
        if let Some(keyspace) = self.keyspace.write_with(|it| it.take()) {
            if let Err(err) = keyspace.persist(PersistMode::SyncAll) {
                log::error!("Failed to persist keyspace during drop: {}", err);
            }
        }
    }
}
