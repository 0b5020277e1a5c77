use crate::StoreConfig;
use crate::disk_store::DiskTier;
use crate::moka_cache::MemoryTier;
use crate::write_queue::DiskWriter;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use vision::clock::SystemClock;
use vision::ports::{Clock, ResultStore};
use vision::{CacheEntry, Fingerprint, RecognitionResult};

/// Recognition cache: moka in front, JSON records on disk behind.
///
/// Reads are served from memory when possible and promoted from disk
/// otherwise. Writes land in memory before `put` returns and reach disk
/// through a single background worker, so disk jobs apply in call order.
/// Expiry is checked lazily against the injected clock.
pub struct TieredResultStore {
    memory: MemoryTier,
    disk: Arc<DiskTier>,
    writer: DiskWriter,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    /// Bumped by every `clear`; disk records read under an older value are not promoted.
    generation: AtomicU64,
}

impl TieredResultStore {
    /// Open the store on the system clock. Must run inside a Tokio runtime.
    pub async fn open(config: StoreConfig) -> Self {
        Self::open_with_clock(config, Arc::new(SystemClock)).await
    }

    pub async fn open_with_clock(config: StoreConfig, clock: Arc<dyn Clock>) -> Self {
        let disk = Arc::new(DiskTier::open(&config.cache_dir).await);
        let (writer, _worker) = DiskWriter::spawn(disk.clone());

        info!(
            "Recognition cache opened (dir: {}, ttl: {}s, memory capacity: {})",
            config.cache_dir.display(),
            config.ttl.as_secs(),
            config
                .memory_capacity
                .map_or_else(|| "unbounded".to_string(), |c| c.to_string())
        );

        Self {
            memory: MemoryTier::new("recognitions", config.memory_capacity),
            disk,
            writer,
            clock,
            ttl: config.ttl,
            generation: AtomicU64::new(0),
        }
    }

    /// Resolves once every disk job queued so far has run
    pub async fn flush(&self) {
        self.writer.flush().await;
    }

    /// Run `load_all` in the background so startup does not wait on disk
    pub fn spawn_load_all(self: &Arc<Self>) -> JoinHandle<usize> {
        let store = Arc::clone(self);
        tokio::spawn(async move { store.load_all().await })
    }

    pub async fn memory_entries(&self) -> u64 {
        self.memory.entry_count().await
    }

    pub fn is_persistent(&self) -> bool {
        self.disk.is_enabled()
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Copy a disk record into memory unless a clear started after `observed`
    /// was read. Live memory entries are never replaced.
    async fn promote(&self, entry: Arc<CacheEntry>, observed: u64) -> bool {
        if self.generation() != observed {
            return false;
        }

        let fingerprint = entry.fingerprint.clone();
        let inserted = self.memory.insert_if_absent(entry).await;
        if inserted && self.generation() != observed {
            // A clear began while inserting and may have missed this entry
            self.memory.remove(&fingerprint).await;
            return false;
        }
        inserted
    }
}

#[async_trait]
impl ResultStore for TieredResultStore {
    async fn get(&self, fingerprint: &Fingerprint) -> Option<RecognitionResult> {
        let now = self.clock.now();

        if let Some(entry) = self.memory.get(fingerprint).await {
            if !entry.is_expired(now, self.ttl) {
                debug!("Memory hit for {}", fingerprint);
                return Some(entry.result.clone());
            }
            debug!("Memory entry for {} expired", fingerprint);
            self.memory.remove(fingerprint).await;
        }

        let observed = self.generation();
        match self.disk.read(fingerprint).await {
            Ok(Some(entry)) if !entry.is_expired(now, self.ttl) => {
                debug!("Disk hit for {}, promoting to memory", fingerprint);
                let result = entry.result.clone();
                self.promote(Arc::new(entry), observed).await;
                Some(result)
            }
            Ok(Some(_)) => {
                debug!("Disk entry for {} expired", fingerprint);
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Ignoring unreadable cache record {}: {}", fingerprint, e);
                None
            }
        }
    }

    async fn put(&self, fingerprint: Fingerprint, result: RecognitionResult) {
        let entry = Arc::new(CacheEntry::new(fingerprint, result, self.clock.now()));
        self.memory.insert(entry.clone()).await;

        if self.disk.is_enabled() {
            self.writer.enqueue_write(entry);
        }
    }

    async fn clear(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.memory.clear();
        let removed = self.writer.clear().await;
        debug!("Cache cleared ({} record(s) removed from disk)", removed);
    }

    async fn load_all(&self) -> usize {
        let observed = self.generation();
        let records = match self.disk.scan().await {
            Ok(records) => records,
            Err(e) => {
                warn!("Failed to scan cache directory: {}", e);
                return 0;
            }
        };

        let now = self.clock.now();
        let mut loaded = 0;
        let mut expired = 0;

        for entry in records {
            if entry.is_expired(now, self.ttl) {
                expired += 1;
                continue;
            }
            if self.generation() != observed {
                debug!("Cache cleared during load, discarding remaining records");
                break;
            }
            if self.promote(Arc::new(entry), observed).await {
                loaded += 1;
            }
        }

        info!(
            "Loaded {} cached recognition(s) from disk ({} expired)",
            loaded, expired
        );
        loaded
    }
}

impl std::fmt::Debug for TieredResultStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TieredResultStore")
            .field("memory", &self.memory)
            .field("disk", &self.disk)
            .field("ttl", &self.ttl)
            .finish()
    }
}
