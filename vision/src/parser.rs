use crate::domain::{DamageLevel, RecognitionResult, RecognitionSource};
use serde::{Deserialize, Deserializer};
use shared::{Error, Result};
use std::collections::BTreeMap;

/// Metadata key holding the unmodified remote answer.
pub const RAW_RESPONSE_KEY: &str = "remote_raw_response";
/// Metadata key holding the damage text exactly as the model wrote it.
pub const DAMAGE_DESCRIPTION_KEY: &str = "damage_description";

/// Shape the remote model is prompted to answer with
#[derive(Debug, Deserialize)]
struct RemoteVehicleResponse {
    make: String,
    model: String,
    #[serde(deserialize_with = "string_or_number")]
    year: String,
    #[serde(rename = "type")]
    vehicle_type: String,
    #[serde(default)]
    damage: Option<String>,
    /// Percentage, 0-100
    confidence: f64,
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, found {}",
            other
        ))),
    }
}

/// Slice from the first `{` through the last `}`, inclusive.
pub fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Turn the remote recognizer's free text into a result.
pub fn parse_response(raw: &str) -> Result<RecognitionResult> {
    let candidate = extract_json(raw)
        .ok_or_else(|| Error::InvalidResponse("no JSON object found in response".to_string()))?;

    let response: RemoteVehicleResponse = serde_json::from_str(candidate)
        .map_err(|e| Error::InvalidResponse(format!("Failed to decode response: {}", e)))?;

    let damage_description = response.damage.unwrap_or_else(|| "none".to_string());

    let mut metadata = BTreeMap::new();
    metadata.insert(RAW_RESPONSE_KEY.to_string(), raw.to_string());
    metadata.insert(DAMAGE_DESCRIPTION_KEY.to_string(), damage_description.clone());

    Ok(RecognitionResult {
        make: response.make,
        model: response.model,
        year: response.year,
        vehicle_type: response.vehicle_type,
        // Not clamped: out-of-range percentages are passed through.
        confidence: (response.confidence / 100.0) as f32,
        damage: DamageLevel::from_description(Some(damage_description.as_str())),
        source: RecognitionSource::Remote,
        metadata,
    })
}
