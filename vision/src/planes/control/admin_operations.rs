use crate::events::{CacheClearedEvent, RecognitionEvent, now_timestamp};
use crate::planes::data::RecognitionService;
use crate::ports::AdminOperations;
use async_trait::async_trait;
use tracing::{info, warn};

#[async_trait]
impl AdminOperations for RecognitionService {
    /// Empty both cache tiers
    async fn clear_cache(&self) {
        self.store.clear().await;
        info!("Recognition cache cleared");
        self.publish(RecognitionEvent::CacheCleared(CacheClearedEvent {
            timestamp: now_timestamp(),
        }));
    }

    /// Best-effort warm-up of the remote model; failures are only logged
    async fn preload_remote_model(&self) {
        let Some(remote) = &self.remote else {
            warn!("Cannot preload - remote recognizer not configured");
            return;
        };

        info!("Preloading remote model '{}'", remote.name());
        match remote.preload().await {
            Ok(()) => info!("Remote model '{}' ready", remote.name()),
            Err(e) => warn!("Failed to preload remote model '{}': {}", remote.name(), e),
        }
    }
}
