//! OCR Types
//!
//! Error type shared by extraction providers and the retrying client.

/// OCR error types
#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    #[error("No API key configured for the extraction provider")]
    MissingApiKey,

    #[error("Request failed: {0}")]
    Request(String),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("Provider returned no content")]
    EmptyResponse,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for OcrError {
    fn from(err: reqwest::Error) -> Self {
        OcrError::Request(err.to_string())
    }
}
