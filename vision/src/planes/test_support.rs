use crate::domain::{RecognitionResult, RecognitionSource};
use crate::fingerprint::{Fingerprint, PreparedImage};
use crate::ports::{LocalRecognizer, RemoteRecognizer, ResultStore};
use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use parking_lot::Mutex;
use shared::RemoteError;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub const TOYOTA_RESPONSE: &str = r#"Sure! Here is the data: {"make":"Toyota","model":"Camry","year":"2018-2020","type":"sedan","damage":"moderate","confidence":87} Thanks!"#;

/// PNG whose pixels depend on `seed`, so different seeds fingerprint differently.
pub fn png_bytes(seed: u8) -> Vec<u8> {
    let image = RgbImage::from_fn(8, 8, |x, y| Rgb([seed, x as u8 * 20, y as u8 * 20]));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<Fingerprint, RecognitionResult>>,
    puts: AtomicUsize,
    clears: AtomicUsize,
}

impl MemoryStore {
    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn clears(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResultStore for MemoryStore {
    async fn get(&self, fingerprint: &Fingerprint) -> Option<RecognitionResult> {
        self.entries.lock().get(fingerprint).cloned()
    }

    async fn put(&self, fingerprint: Fingerprint, result: RecognitionResult) {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.entries.lock().insert(fingerprint, result);
    }

    async fn clear(&self) {
        self.clears.fetch_add(1, Ordering::SeqCst);
        self.entries.lock().clear();
    }

    async fn load_all(&self) -> usize {
        self.entries.lock().len()
    }
}

pub struct ScriptedRemote {
    outcome: Result<String, RemoteError>,
    preload_outcome: Result<(), RemoteError>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    preloads: AtomicUsize,
}

impl ScriptedRemote {
    pub fn answering(text: &str) -> Self {
        Self::with_outcome(Ok(text.to_string()))
    }

    pub fn failing(error: RemoteError) -> Self {
        Self::with_outcome(Err(error))
    }

    fn with_outcome(outcome: Result<String, RemoteError>) -> Self {
        Self {
            outcome,
            preload_outcome: Ok(()),
            delay: None,
            calls: AtomicUsize::new(0),
            preloads: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_failing_preload(mut self, error: RemoteError) -> Self {
        self.preload_outcome = Err(error);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn preloads(&self) -> usize {
        self.preloads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteRecognizer for ScriptedRemote {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn recognize(&self, jpeg: &[u8]) -> Result<String, RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(PreparedImage::decode(jpeg).is_ok(), "remote must receive a decodable JPEG");
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.outcome.clone()
    }

    async fn preload(&self) -> Result<(), RemoteError> {
        self.preloads.fetch_add(1, Ordering::SeqCst);
        self.preload_outcome.clone()
    }
}

#[derive(Default)]
pub struct CountingLocal {
    calls: AtomicUsize,
}

impl CountingLocal {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocalRecognizer for CountingLocal {
    async fn recognize(&self, _image: &PreparedImage) -> RecognitionResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        RecognitionResult::unknown(RecognitionSource::Local)
    }
}
