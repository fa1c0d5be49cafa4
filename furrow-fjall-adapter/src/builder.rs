use crate::config::FjallVersionStoreConfig;
use crate::store::FjallVersionStore;
use fjall::CompressionType;
use furrow::get_cpu_count;

/// Builder for an owning [`FjallVersionStore`].
///
/// Provides presets for common deployments plus individual setters. Later
/// calls override earlier ones, so a preset can be refined:
///
/// ```rust,ignore
/// let store = FjallVersionStore::with_config()
///     .production_preset()
///     .db_path("/var/lib/app/migrations")
///     .fsync_frequency(0)
///     .build();
/// ```
pub struct FjallVersionStoreBuilder {
    store_config: FjallVersionStoreConfig,
}

impl Default for FjallVersionStoreBuilder {
    fn default() -> Self {
        FjallVersionStoreBuilder::new()
    }
}

impl FjallVersionStoreBuilder {
    #[inline]
    pub fn new() -> FjallVersionStoreBuilder {
        FjallVersionStoreBuilder {
            store_config: FjallVersionStoreConfig::new(),
        }
    }

    /// Applies settings for a long-running service sharing the machine.
    ///
    /// This configures:
    /// - 32 MB cache
    /// - Half the CPU cores for flushing, one compaction worker
    /// - Bloom filter with 10 bits per key
    /// - 100ms background fsync on top of the per-write sync
    /// - LZ4 compression
    #[inline]
    pub fn production_preset(self) -> Self {
        let cpus = get_cpu_count();

        self.cache_size(32 * 1024 * 1024)
            .flush_workers((cpus / 2).max(1))
            .compaction_workers(1)
            .bloom_filter_bits(10)
            .fsync_frequency(100)
            .compression_type(CompressionType::Lz4)
    }

    /// Applies settings that keep the footprint small, for tests and
    /// short-lived tooling.
    #[inline]
    pub fn low_memory_preset(self) -> Self {
        self.cache_size(1024 * 1024)
            .max_journaling_size(16 * 1024 * 1024)
            .flush_workers(1)
            .compaction_workers(1)
            .bloom_filter_bits(10)
    }

    #[inline]
    pub fn db_path(self, db_path: &str) -> Self {
        self.store_config.set_db_path(db_path);
        self
    }

    #[inline]
    pub fn partition_name(self, partition_name: &str) -> Self {
        self.store_config.set_partition_name(partition_name);
        self
    }

    #[inline]
    pub fn manual_journal_persist(self, manual_journal_persist: bool) -> Self {
        self.store_config.set_manual_journal_persist(manual_journal_persist);
        self
    }

    #[inline]
    pub fn flush_workers(self, count: usize) -> Self {
        self.store_config.set_flush_workers(count);
        self
    }

    #[inline]
    pub fn compaction_workers(self, count: usize) -> Self {
        self.store_config.set_compaction_workers(count);
        self
    }

    #[inline]
    pub fn cache_size(self, bytes: u64) -> Self {
        self.store_config.set_cache_size(bytes);
        self
    }

    #[inline]
    pub fn max_journaling_size(self, bytes: u64) -> Self {
        self.store_config.set_max_journaling_size(bytes);
        self
    }

    #[inline]
    pub fn fsync_frequency(self, ms: u16) -> Self {
        self.store_config.set_fsync_frequency(ms);
        self
    }

    /// Bits per key of the partition bloom filter, capped at 127.
    #[inline]
    pub fn bloom_filter_bits(self, bits: u8) -> Self {
        let bits = i8::try_from(bits).unwrap_or(i8::MAX);
        self.store_config.set_bloom_filter_bits(bits);
        self
    }

    /// Turns the partition bloom filter off.
    #[inline]
    pub fn disable_bloom_filter(self) -> Self {
        self.store_config.set_bloom_filter_bits(-1);
        self
    }

    #[inline]
    pub fn compression_type(self, compression_type: CompressionType) -> Self {
        self.store_config.set_compression_type(compression_type);
        self
    }

    #[inline]
    pub fn build(self) -> FjallVersionStore {
        FjallVersionStore::new(self.store_config)
    }
}
