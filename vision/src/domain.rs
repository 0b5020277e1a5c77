use crate::fingerprint::Fingerprint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageLevel {
    #[default]
    None,
    Minor,
    Moderate,
    Severe,
}

impl DamageLevel {
    /// Map a free-text damage description onto a level.
    /// Matching ignores case but not surrounding whitespace; anything
    /// unrecognised is `None`.
    pub fn from_description(description: Option<&str>) -> Self {
        match description.map(str::to_lowercase).as_deref() {
            Some("minor") => DamageLevel::Minor,
            Some("moderate") => DamageLevel::Moderate,
            Some("severe") => DamageLevel::Severe,
            _ => DamageLevel::None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecognitionSource {
    Remote,
    Local,
    Manual,
}

/// Outcome of identifying a vehicle in a photograph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecognitionResult {
    pub make: String,
    pub model: String,
    /// Free text, ranges such as "2018-2020" are allowed.
    pub year: String,
    pub vehicle_type: String,
    pub confidence: f32,
    pub damage: DamageLevel,
    pub source: RecognitionSource,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl RecognitionResult {
    pub const UNKNOWN: &str = "Unknown";

    /// Zero-confidence placeholder used when nothing could be recognised.
    pub fn unknown(source: RecognitionSource) -> Self {
        Self {
            make: Self::UNKNOWN.to_string(),
            model: Self::UNKNOWN.to_string(),
            year: Self::UNKNOWN.to_string(),
            vehicle_type: Self::UNKNOWN.to_string(),
            confidence: 0.0,
            source,
            damage: DamageLevel::None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.make == Self::UNKNOWN && self.model == Self::UNKNOWN
    }
}

/// A cached recognition, keyed by the fingerprint of the image it came from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub fingerprint: Fingerprint,
    pub result: RecognitionResult,
    pub created_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(fingerprint: Fingerprint, result: RecognitionResult, created_at: DateTime<Utc>) -> Self {
        Self {
            fingerprint,
            result,
            created_at,
        }
    }

    /// An entry is expired once strictly more than `ttl` has elapsed.
    /// Entries stamped in the future are never expired.
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        match (now - self.created_at).to_std() {
            Ok(elapsed) => elapsed > ttl,
            Err(_) => false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct RecognitionSettings {
    /// Upper bound on a single remote recognition call.
    pub remote_timeout: Duration,
    /// JPEG quality used when uploading the image to the remote recognizer.
    pub jpeg_quality: u8,
}

impl Default for RecognitionSettings {
    fn default() -> Self {
        Self {
            remote_timeout: Duration::from_secs(30),
            jpeg_quality: 80,
        }
    }
}
