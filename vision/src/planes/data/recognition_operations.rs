use crate::domain::{RecognitionResult, RecognitionSettings};
use crate::events::{
    CacheHitEvent, FallbackReason, LocalFallbackEvent, RecognitionEvent, RemoteFailedEvent,
    RemoteRecognizedEvent, now_timestamp,
};
use crate::fingerprint::{Fingerprint, PreparedImage};
use crate::parser::parse_response;
use crate::ports::{LocalRecognizer, RecognitionOperations, RemoteRecognizer, ResultStore};
use async_trait::async_trait;
use serde::Serialize;
use shared::{Error, RemoteError, Result};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Terminal state a recognition request ended in
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServedFrom {
    Cache,
    Remote,
    Local,
}

#[derive(Clone, Debug)]
pub struct Served {
    pub fingerprint: Fingerprint,
    pub served_from: ServedFrom,
    pub result: RecognitionResult,
}

/// Application service that orchestrates vehicle recognition:
/// cache lookup, remote attempt, parse, cache write and local fallback.
#[derive(Clone)]
pub struct RecognitionService {
    pub(crate) store: Arc<dyn ResultStore>,
    pub(crate) remote: Option<Arc<dyn RemoteRecognizer>>,
    local: Arc<dyn LocalRecognizer>,
    settings: RecognitionSettings,
    event_broadcaster: Option<broadcast::Sender<RecognitionEvent>>,
}

impl RecognitionService {
    /// `remote` is `None` when no credential is configured; every request
    /// then resolves through the local recognizer.
    pub fn new(
        store: Arc<dyn ResultStore>,
        remote: Option<Arc<dyn RemoteRecognizer>>,
        local: Arc<dyn LocalRecognizer>,
        settings: RecognitionSettings,
    ) -> Self {
        match &remote {
            Some(remote) => info!("Recognition service initialized with remote recognizer '{}'", remote.name()),
            None => warn!("Recognition service initialized without remote recognizer - will use local fallback"),
        }

        Self {
            store,
            remote,
            local,
            settings,
            event_broadcaster: None,
        }
    }

    pub fn with_event_broadcaster(mut self, broadcaster: broadcast::Sender<RecognitionEvent>) -> Self {
        self.event_broadcaster = Some(broadcaster);
        self
    }

    pub fn remote_enabled(&self) -> bool {
        self.remote.is_some()
    }

    /// Recognize a vehicle from raw image bytes, reporting which tier served it.
    /// Fails only when the bytes cannot be decoded as an image.
    pub async fn recognize(&self, image_bytes: &[u8]) -> Result<Served> {
        let bytes = image_bytes.to_vec();
        let image = run_blocking(move || PreparedImage::decode(&bytes)).await?;
        Ok(self.recognize_prepared(&image).await)
    }

    pub async fn recognize_prepared(&self, image: &PreparedImage) -> Served {
        let fingerprint = image.fingerprint().clone();
        debug!("Starting vehicle recognition for {}", fingerprint);

        if let Some(result) = self.store.get(&fingerprint).await {
            info!("Returning cached result for {}", fingerprint);
            self.publish(RecognitionEvent::CacheHit(CacheHitEvent {
                fingerprint: fingerprint.to_string(),
                make: result.make.clone(),
                model: result.model.clone(),
                timestamp: now_timestamp(),
            }));
            return Served {
                fingerprint,
                served_from: ServedFrom::Cache,
                result,
            };
        }

        let reason = match &self.remote {
            Some(remote) => match self.attempt_remote(remote.as_ref(), image).await {
                Ok(result) => {
                    self.store.put(fingerprint.clone(), result.clone()).await;
                    info!(
                        "Recognized vehicle with {}: {} {} ({:.0}%)",
                        remote.name(),
                        result.make,
                        result.model,
                        result.confidence * 100.0
                    );
                    self.publish(RecognitionEvent::RemoteRecognized(RemoteRecognizedEvent {
                        fingerprint: fingerprint.to_string(),
                        recognizer: remote.name().to_string(),
                        make: result.make.clone(),
                        model: result.model.clone(),
                        confidence: result.confidence,
                        timestamp: now_timestamp(),
                    }));
                    return Served {
                        fingerprint,
                        served_from: ServedFrom::Remote,
                        result,
                    };
                }
                Err(e) => {
                    warn!("{} recognition failed for {}: {}", remote.name(), fingerprint, e);
                    self.publish(RecognitionEvent::RemoteFailed(RemoteFailedEvent {
                        fingerprint: fingerprint.to_string(),
                        recognizer: remote.name().to_string(),
                        reason: e.to_string(),
                        timestamp: now_timestamp(),
                    }));
                    FallbackReason::RemoteFailed
                }
            },
            None => FallbackReason::RemoteNotConfigured,
        };

        info!("Using local fallback recognition for {}", fingerprint);
        let result = self.local.recognize(image).await;
        self.publish(RecognitionEvent::LocalFallback(LocalFallbackEvent {
            fingerprint: fingerprint.to_string(),
            reason,
            timestamp: now_timestamp(),
        }));

        Served {
            fingerprint,
            served_from: ServedFrom::Local,
            result,
        }
    }

    /// One remote call, bounded by the configured timeout, then parsed.
    async fn attempt_remote(
        &self,
        remote: &dyn RemoteRecognizer,
        image: &PreparedImage,
    ) -> Result<RecognitionResult> {
        let quality = self.settings.jpeg_quality;
        let image = image.clone();
        let jpeg = run_blocking(move || image.encode_jpeg(quality)).await?;

        let raw = tokio::time::timeout(self.settings.remote_timeout, remote.recognize(&jpeg))
            .await
            .map_err(|_| Error::Remote(RemoteError::Timeout))??;

        parse_response(&raw)
    }

    pub(crate) fn publish(&self, event: RecognitionEvent) {
        if let Some(ref broadcaster) = self.event_broadcaster {
            let kind = event.kind();
            match broadcaster.send(event) {
                Ok(subscriber_count) => {
                    debug!("Broadcasted {} event to {} subscriber(s)", kind, subscriber_count);
                }
                Err(_) => {
                    debug!("No subscribers for {} event", kind);
                }
            }
        }
    }
}

/// Decoding, hashing and re-encoding are CPU bound and stay off the async workers.
async fn run_blocking<T, F>(task: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| Error::Internal(format!("Image processing task failed: {}", e)))?
}

impl std::fmt::Debug for RecognitionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecognitionService")
            .field("remote", &self.remote.as_ref().map(|r| r.name().to_string()))
            .field("settings", &self.settings)
            .finish()
    }
}

#[async_trait]
impl RecognitionOperations for RecognitionService {
    async fn recognize_vehicle(&self, image: &[u8]) -> Result<RecognitionResult> {
        self.recognize(image).await.map(|served| served.result)
    }
}
