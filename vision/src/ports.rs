#![deny(clippy::all)]

use crate::domain::RecognitionResult;
use crate::fingerprint::{Fingerprint, PreparedImage};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::{RemoteError, Result};

// Ports are the pluggable extension points the recognition core is composed from

/// Port for the two-tier recognition cache.
/// Implementations absorb their own persistence failures: none of these
/// operations report an error.
#[async_trait]
pub trait ResultStore: Send + Sync + 'static {
    async fn get(&self, fingerprint: &Fingerprint) -> Option<RecognitionResult>;

    /// The entry must be visible to `get` as soon as this returns.
    async fn put(&self, fingerprint: Fingerprint, result: RecognitionResult);

    async fn clear(&self);

    /// Populate the fast tier from durable storage, returning how many entries were loaded.
    async fn load_all(&self) -> usize;
}

/// Port for the cloud vision recognizer.
#[async_trait]
pub trait RemoteRecognizer: Send + Sync + 'static {
    fn name(&self) -> &str;

    /// Send a JPEG-encoded image and return the model's raw text answer.
    async fn recognize(&self, jpeg: &[u8]) -> std::result::Result<String, RemoteError>;

    async fn preload(&self) -> std::result::Result<(), RemoteError> {
        Ok(())
    }
}

/// Port for the on-device fallback recognizer. It always produces a result.
#[async_trait]
pub trait LocalRecognizer: Send + Sync + 'static {
    async fn recognize(&self, image: &PreparedImage) -> RecognitionResult;
}

pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

/// Data plane: vehicle recognition requests
#[async_trait]
pub trait RecognitionOperations: Send + Sync + 'static {
    async fn recognize_vehicle(&self, image: &[u8]) -> Result<RecognitionResult>;
}

/// Control plane: cache administration and warm-up
#[async_trait]
pub trait AdminOperations: Send + Sync + 'static {
    async fn clear_cache(&self);

    async fn preload_remote_model(&self);
}
