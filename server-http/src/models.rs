use serde::Serialize;
use vision::{RecognitionResult, ServedFrom};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub message: String,
    pub remote_enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct RecognizeResponse {
    pub fingerprint: String,
    pub served_from: ServedFrom,
    pub result: RecognitionResult,
}

#[derive(Debug, Serialize)]
pub struct PreloadResponse {
    pub accepted: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
