// shared/src/lib.rs

/// Failures reported by a remote recognizer.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("network error: {0}")]
    Network(String),
    #[error("API quota exceeded")]
    QuotaExceeded,
    #[error("request timeout")]
    Timeout,
    #[error("model is not available")]
    ModelUnavailable,
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("remote recognizer not configured")]
    NotConfigured,
    #[error("remote recognition failed: {0}")]
    Remote(#[from] RemoteError),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("persistence: {0}")]
    Persistence(String),
    #[error("image processing failed: {0}")]
    ImageProcessing(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Persistence(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Persistence(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

pub mod config;
