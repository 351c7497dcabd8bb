//! OCR Module
//!
//! Everything that talks to, or post-processes the output of, the external
//! document-understanding service.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use docsight::ocr::{MistralProvider, RetryPolicy, RetryingExtractionClient};
//!
//! let provider = Arc::new(MistralProvider::with_api_key(&api_key));
//! let client = RetryingExtractionClient::new(provider, RetryPolicy::default());
//!
//! let text = client
//!     .extract(&bytes, "application/pdf", &ProcessingOptions::default())
//!     .await?;
//! ```

mod client;
mod language;
mod pdf;
mod provider;
mod types;

pub use client::{
    build_prompt, RetryPolicy, RetryingExtractionClient, DEFAULT_RETRY_ATTEMPTS,
    DEFAULT_RETRY_DELAY,
};
pub use language::{
    detect_or_unknown, LanguageDetector, LanguageError, ScriptLanguageDetector,
    MIN_DETECTION_CHARS, UNKNOWN_LANGUAGE,
};
pub use pdf::{LopdfPageCounter, PageCounter};
pub use provider::{
    data_uri, ExtractionProvider, MistralProvider, DEFAULT_MISTRAL_MODEL, DEFAULT_MISTRAL_URL,
};
pub use types::OcrError;

#[cfg(test)]
pub(crate) use provider::MockProvider;
