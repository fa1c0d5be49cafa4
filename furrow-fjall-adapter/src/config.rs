use fjall::{CompressionType, Config, PartitionCreateOptions};
use furrow::common::{atomic, Atomic, ReadExecutor, WriteExecutor, VERSION_RECORD_NAME};
use furrow::get_cpu_count;
use std::sync::atomic::{AtomicBool, AtomicI8, AtomicU16, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

/// Fjall version store configuration.
///
/// A cloneable, thread-safe holder for the keyspace and partition settings
/// of a [`FjallVersionStore`](crate::FjallVersionStore). Uses
/// `Arc<FjallVersionStoreConfigInner>` so clones share the same settings, and
/// atomic fields so no lock is needed to read them.
///
/// Usage: configure through
/// [`FjallVersionStore::with_config()`](crate::FjallVersionStore::with_config)
/// rather than by hand.
#[derive(Clone)]
pub struct FjallVersionStoreConfig {
    inner: Arc<FjallVersionStoreConfigInner>,
}

impl Default for FjallVersionStoreConfig {
    fn default() -> Self {
        FjallVersionStoreConfig::new()
    }
}

impl FjallVersionStoreConfig {
    /// Creates a configuration with default values:
    /// - Partition: `data_migrations`
    /// - Cache: 16 MB (the record is tiny; most of it is never used)
    /// - Journal: 64 MB max
    /// - Flush workers: number of available CPU cores
    /// - Compaction workers: half of available CPU cores
    /// - Every record write persisted with `SyncAll`
    #[inline]
    pub fn new() -> FjallVersionStoreConfig {
        FjallVersionStoreConfig {
            inner: Arc::new(FjallVersionStoreConfigInner::new()),
        }
    }

    /// Translates these settings into fjall's keyspace configuration.
    pub(crate) fn keyspace_config(&self) -> Config {
        let mut config = Config::new(self.inner.db_path())
            .manual_journal_persist(self.manual_journal_persist())
            .flush_workers(self.flush_workers())
            .compaction_workers(self.compaction_workers())
            .cache_size(self.cache_size())
            .max_journaling_size(self.max_journaling_size());

        if self.fsync_frequency() > 0 {
            config = config.fsync_ms(Some(self.fsync_frequency()));
        }
        config
    }

    /// Translates these settings into fjall's partition options.
    pub(crate) fn partition_config(&self) -> PartitionCreateOptions {
        PartitionCreateOptions::default()
            .bloom_filter_bits(if self.bloom_filter_bits() < 0 {
                None
            } else {
                Some(self.bloom_filter_bits() as u8)
            })
            .compression(self.compression_type())
    }

    #[inline]
    pub fn db_path(&self) -> &str {
        self.inner.db_path()
    }

    /// Sets the keyspace directory. Only the first call takes effect.
    #[inline]
    pub(crate) fn set_db_path(&self, db_path: &str) {
        self.inner.db_path.get_or_init(|| db_path.to_string());
    }

    /// Name of the partition that holds the applied-version record.
    #[inline]
    pub fn partition_name(&self) -> String {
        self.inner.partition_name.read_with(|it| it.clone())
    }

    #[inline]
    pub(crate) fn set_partition_name(&self, partition_name: &str) {
        self.inner
            .partition_name
            .write_with(|it| *it = partition_name.to_string())
    }

    /// When set, record writes are left in the journal buffer instead of
    /// being synced to disk right away.
    #[inline]
    pub fn manual_journal_persist(&self) -> bool {
        self.inner.manual_journal_persist.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_manual_journal_persist(&self, v: bool) {
        self.inner.manual_journal_persist.store(v, Ordering::Relaxed)
    }

    #[inline]
    pub fn flush_workers(&self) -> usize {
        self.inner.flush_workers.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_flush_workers(&self, count: usize) {
        self.inner.flush_workers.store(count, Ordering::Relaxed)
    }

    #[inline]
    pub fn compaction_workers(&self) -> usize {
        self.inner.compaction_workers.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_compaction_workers(&self, count: usize) {
        self.inner.compaction_workers.store(count, Ordering::Relaxed)
    }

    /// Block cache size in bytes.
    #[inline]
    pub fn cache_size(&self) -> u64 {
        self.inner.cache_size.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_cache_size(&self, bytes: u64) {
        self.inner.cache_size.store(bytes, Ordering::Relaxed)
    }

    #[inline]
    pub fn max_journaling_size(&self) -> u64 {
        self.inner.max_journaling_size.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_max_journaling_size(&self, bytes: u64) {
        self.inner.max_journaling_size.store(bytes, Ordering::Relaxed)
    }

    /// Background fsync interval in milliseconds; zero disables it.
    #[inline]
    pub fn fsync_frequency(&self) -> u16 {
        self.inner.fsync_frequency.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_fsync_frequency(&self, ms: u16) {
        self.inner.fsync_frequency.store(ms, Ordering::Relaxed)
    }

    /// Bloom filter bits per key; negative disables the filter.
    #[inline]
    pub fn bloom_filter_bits(&self) -> i8 {
        self.inner.bloom_filter_bits.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_bloom_filter_bits(&self, bits: i8) {
        self.inner.bloom_filter_bits.store(bits, Ordering::Relaxed)
    }

    #[inline]
    pub fn compression_type(&self) -> CompressionType {
        self.inner.compression_type.read_with(|it| *it)
    }

    #[inline]
    pub(crate) fn set_compression_type(&self, compression_type: CompressionType) {
        self.inner
            .compression_type
            .write_with(|it| *it = compression_type)
    }
}

struct FjallVersionStoreConfigInner {
    db_path: OnceLock<String>,
    partition_name: Atomic<String>,
    manual_journal_persist: AtomicBool,
    flush_workers: AtomicUsize,
    compaction_workers: AtomicUsize,
    cache_size: AtomicU64,
    max_journaling_size: AtomicU64,
    fsync_frequency: AtomicU16,
    bloom_filter_bits: AtomicI8,
    compression_type: Atomic<CompressionType>,
}

impl FjallVersionStoreConfigInner {
    pub const DEFAULT_CACHE_MB: u64 = 16;

    pub const DEFAULT_MAX_JOURNALING_MB: u64 = 64;

    fn new() -> FjallVersionStoreConfigInner {
        let cpus = get_cpu_count();

        FjallVersionStoreConfigInner {
            db_path: OnceLock::new(),
            partition_name: atomic(VERSION_RECORD_NAME.to_string()),
            manual_journal_persist: AtomicBool::new(false),
            flush_workers: AtomicUsize::new(cpus.max(1)),
            compaction_workers: AtomicUsize::new((cpus / 2).max(1)),
            cache_size: AtomicU64::new(Self::DEFAULT_CACHE_MB * 1_024 * 1_024),
            max_journaling_size: AtomicU64::new(Self::DEFAULT_MAX_JOURNALING_MB * 1_024 * 1_024),
            fsync_frequency: AtomicU16::new(0),
            bloom_filter_bits: AtomicI8::new(10),
            compression_type: atomic(CompressionType::Lz4),
        }
    }

    #[inline]
    fn db_path(&self) -> &str {
        self.db_path.get().map(String::as_str).unwrap_or("")
    }
}
