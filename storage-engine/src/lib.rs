pub mod disk_store;
pub mod moka_cache;
pub mod tiered_store;
pub mod write_queue;

pub use tiered_store::TieredResultStore;

use shared::config::Config;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Settings for the two-tier recognition cache
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub cache_dir: PathBuf,
    pub ttl: Duration,
    /// Entry bound for the memory tier; unbounded when `None`.
    pub memory_capacity: Option<u64>,
}

impl StoreConfig {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            ttl: DEFAULT_TTL,
            memory_capacity: None,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_memory_capacity(mut self, capacity: u64) -> Self {
        self.memory_capacity = Some(capacity);
        self
    }
}

impl From<&Config> for StoreConfig {
    fn from(config: &Config) -> Self {
        Self {
            cache_dir: config.cache_dir.clone(),
            ttl: config.cache_ttl,
            memory_capacity: config.memory_capacity,
        }
    }
}
