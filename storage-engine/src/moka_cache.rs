use moka::future::Cache;
use std::fmt::Debug;
use std::sync::Arc;
use vision::{CacheEntry, Fingerprint};

/// Moka-backed fast tier of the recognition cache.
/// Expiry is decided by the owning store against its clock, so moka's own
/// time-to-live is never configured here.
#[derive(Clone)]
pub struct MemoryTier {
    cache: Cache<Fingerprint, Arc<CacheEntry>>,
}

impl MemoryTier {
    /// Create a memory tier, bounded to `max_entries` when given
    pub fn new(name: &str, max_entries: Option<u64>) -> Self {
        let mut builder = Cache::builder().name(name);

        if let Some(capacity) = max_entries {
            builder = builder.max_capacity(capacity);
        }

        Self {
            cache: builder.build(),
        }
    }

    pub async fn get(&self, fingerprint: &Fingerprint) -> Option<Arc<CacheEntry>> {
        self.cache.get(fingerprint).await
    }

    pub async fn insert(&self, entry: Arc<CacheEntry>) {
        self.cache.insert(entry.fingerprint.clone(), entry).await;
    }

    /// Insert unless a value is already present; true when the entry was stored.
    pub async fn insert_if_absent(&self, entry: Arc<CacheEntry>) -> bool {
        self.cache
            .entry(entry.fingerprint.clone())
            .or_insert(entry)
            .await
            .is_fresh()
    }

    pub async fn remove(&self, fingerprint: &Fingerprint) {
        self.cache.invalidate(fingerprint).await;
    }

    pub fn clear(&self) {
        self.cache.invalidate_all();
    }

    pub async fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }
}

impl Debug for MemoryTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTier")
            .field("entry_count", &self.cache.entry_count())
            .field("weighted_size", &self.cache.weighted_size())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use vision::{RecognitionResult, RecognitionSource};

    fn entry(seed: &[u8], make: &str) -> Arc<CacheEntry> {
        let mut result = RecognitionResult::unknown(RecognitionSource::Remote);
        result.make = make.to_string();
        Arc::new(CacheEntry::new(Fingerprint::of_bytes(seed), result, Utc::now()))
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let tier = MemoryTier::new("test", None);
        let stored = entry(b"a", "Toyota");

        tier.insert(stored.clone()).await;

        let fetched = tier.get(&stored.fingerprint).await.unwrap();
        assert_eq!(fetched.result.make, "Toyota");
    }

    #[tokio::test]
    async fn test_insert_replaces_previous_entry() {
        let tier = MemoryTier::new("test", None);

        tier.insert(entry(b"a", "Toyota")).await;
        tier.insert(entry(b"a", "Honda")).await;

        let fetched = tier.get(&Fingerprint::of_bytes(b"a")).await.unwrap();
        assert_eq!(fetched.result.make, "Honda");
    }

    #[tokio::test]
    async fn test_insert_if_absent_keeps_live_entry() {
        let tier = MemoryTier::new("test", None);

        tier.insert(entry(b"a", "Live")).await;
        assert!(!tier.insert_if_absent(entry(b"a", "Stale")).await);
        assert!(tier.insert_if_absent(entry(b"b", "Fresh")).await);

        let fetched = tier.get(&Fingerprint::of_bytes(b"a")).await.unwrap();
        assert_eq!(fetched.result.make, "Live");
        assert_eq!(tier.entry_count().await, 2);
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let tier = MemoryTier::new("test", None);
        tier.insert(entry(b"a", "Toyota")).await;
        tier.insert(entry(b"b", "Honda")).await;

        tier.remove(&Fingerprint::of_bytes(b"a")).await;
        assert!(tier.get(&Fingerprint::of_bytes(b"a")).await.is_none());

        tier.clear();
        assert!(tier.get(&Fingerprint::of_bytes(b"b")).await.is_none());
        assert_eq!(tier.entry_count().await, 0);
    }

    #[tokio::test]
    async fn test_bounded_tier_evicts() {
        let tier = MemoryTier::new("bounded", Some(2));

        for seed in [b"1", b"2", b"3", b"4"] {
            tier.insert(entry(seed, "Ford")).await;
        }

        assert!(tier.entry_count().await <= 2, "tier should hold at most 2 entries");
    }
}
