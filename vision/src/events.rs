use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecognitionEvent {
    CacheHit(CacheHitEvent),
    RemoteRecognized(RemoteRecognizedEvent),
    RemoteFailed(RemoteFailedEvent),
    LocalFallback(LocalFallbackEvent),
    CacheCleared(CacheClearedEvent),
}

impl RecognitionEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            RecognitionEvent::CacheHit(_) => "cache_hit",
            RecognitionEvent::RemoteRecognized(_) => "remote_recognized",
            RecognitionEvent::RemoteFailed(_) => "remote_failed",
            RecognitionEvent::LocalFallback(_) => "local_fallback",
            RecognitionEvent::CacheCleared(_) => "cache_cleared",
        }
    }

    pub fn fingerprint(&self) -> Option<&str> {
        match self {
            RecognitionEvent::CacheHit(e) => Some(&e.fingerprint),
            RecognitionEvent::RemoteRecognized(e) => Some(&e.fingerprint),
            RecognitionEvent::RemoteFailed(e) => Some(&e.fingerprint),
            RecognitionEvent::LocalFallback(e) => Some(&e.fingerprint),
            RecognitionEvent::CacheCleared(_) => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheHitEvent {
    pub fingerprint: String,
    pub make: String,
    pub model: String,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteRecognizedEvent {
    pub fingerprint: String,
    pub recognizer: String,
    pub make: String,
    pub model: String,
    pub confidence: f32,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteFailedEvent {
    pub fingerprint: String,
    pub recognizer: String,
    pub reason: String,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    RemoteNotConfigured,
    RemoteFailed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalFallbackEvent {
    pub fingerprint: String,
    pub reason: FallbackReason,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheClearedEvent {
    pub timestamp: u64,
}

/// Helper to get current timestamp in seconds since UNIX epoch
pub fn now_timestamp() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or_default()
}
