use crate::ports::RemoteRecognizer;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use shared::config::RemoteConfig;
use shared::{Error, RemoteError, Result};
use std::time::Duration;
use tracing::{debug, warn};

const API_KEY_HEADER: &str = "x-goog-api-key";
const RETRY_BACKOFF: Duration = Duration::from_millis(500);

pub const VEHICLE_PROMPT: &str = r#"Analyze this vehicle image and provide the following information:
1. Vehicle make (manufacturer)
2. Vehicle model
3. Approximate year or year range
4. Vehicle type (sedan, SUV, truck, etc.)
5. Damage assessment if visible (minor, moderate, severe)
6. Confidence level (0-100%)

Focus on identifying the vehicle even if it's damaged. Provide your response in the following JSON format:
{
    "make": "manufacturer name",
    "model": "model name",
    "year": "year or year range",
    "type": "vehicle type",
    "damage": "damage level or none",
    "confidence": confidence_percentage
}"#;

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text { text: &'a str },
    InlineData { inline_data: InlineData },
}

#[derive(Serialize)]
struct InlineData {
    mime_type: &'static str,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, parts concatenated
    fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

/// Gemini generateContent client
pub struct GeminiRecognizer {
    client: reqwest::Client,
    config: RemoteConfig,
}

impl GeminiRecognizer {
    pub fn new(config: RemoteConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(Error::NotConfigured);
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn model_url(&self) -> String {
        format!(
            "{}/models/{}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }

    async fn generate_once(&self, body: &GenerateContentRequest<'_>) -> std::result::Result<String, RemoteError> {
        let response = self
            .client
            .post(format!("{}:generateContent", self.model_url()))
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(body)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        let text = response.text().await.map_err(classify_transport)?;

        if !status.is_success() {
            return Err(classify_status(status, &text));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&text)
            .map_err(|e| RemoteError::Network(format!("Malformed generateContent body: {}", e)))?;

        parsed.into_text().ok_or(RemoteError::ModelUnavailable)
    }
}

#[async_trait]
impl RemoteRecognizer for GeminiRecognizer {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn recognize(&self, jpeg: &[u8]) -> std::result::Result<String, RemoteError> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: VEHICLE_PROMPT,
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: "image/jpeg",
                            data: STANDARD.encode(jpeg),
                        },
                    },
                ],
            }],
        };

        let mut attempt = 0;
        loop {
            match self.generate_once(&body).await {
                Err(RemoteError::Network(cause)) if attempt < self.config.max_retries => {
                    attempt += 1;
                    warn!(
                        "Gemini request failed ({}), retry {}/{}",
                        cause, attempt, self.config.max_retries
                    );
                    tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                }
                outcome => {
                    debug!("Gemini request finished after {} attempt(s)", attempt + 1);
                    return outcome;
                }
            }
        }
    }

    async fn preload(&self) -> std::result::Result<(), RemoteError> {
        let response = self
            .client
            .get(self.model_url())
            .header(API_KEY_HEADER, &self.config.api_key)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let text = response.text().await.unwrap_or_default();
        Err(classify_status(status, &text))
    }
}

impl std::fmt::Debug for GeminiRecognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiRecognizer")
            .field("model", &self.config.model)
            .field("endpoint", &self.config.endpoint)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

fn mentions_quota(text: &str) -> bool {
    text.to_lowercase().contains("quota")
}

fn classify_transport(err: reqwest::Error) -> RemoteError {
    if err.is_timeout() {
        RemoteError::Timeout
    } else if mentions_quota(&err.to_string()) {
        RemoteError::QuotaExceeded
    } else {
        RemoteError::Network(err.to_string())
    }
}

fn classify_status(status: StatusCode, body: &str) -> RemoteError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => RemoteError::QuotaExceeded,
        _ if mentions_quota(body) => RemoteError::QuotaExceeded,
        StatusCode::NOT_FOUND | StatusCode::SERVICE_UNAVAILABLE => RemoteError::ModelUnavailable,
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => RemoteError::Timeout,
        _ => {
            let snippet: String = body.chars().take(200).collect();
            RemoteError::Network(format!("HTTP {}: {}", status, snippet))
        }
    }
}
