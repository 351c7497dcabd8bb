//! Extraction Providers
//!
//! Defines the provider trait and the Mistral OCR backend.

use async_trait::async_trait;
use base64::Engine;

use super::types::OcrError;

/// Default Mistral chat-completions endpoint
pub const DEFAULT_MISTRAL_URL: &str = "https://api.mistral.ai/v1/chat/completions";

/// Default OCR model
pub const DEFAULT_MISTRAL_MODEL: &str = "mistral-ocr-latest";

/// User turn sent alongside the document
const USER_INSTRUCTION: &str = "Process this document according to the system instructions.";

/// External document-understanding service
///
/// Takes the raw document plus a natural-language directive and returns
/// unstructured text. One call, no retries; see `RetryingExtractionClient`.
#[async_trait]
pub trait ExtractionProvider: Send + Sync {
    /// Short provider name for logs
    fn name(&self) -> &'static str;

    /// Extract text from a document
    async fn extract(&self, data: &[u8], mime_type: &str, prompt: &str) -> Result<String, OcrError>;
}

/// Encode a document as an inline `data:` URI
pub fn data_uri(data: &[u8], mime_type: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(data);
    format!("data:{};base64,{}", mime_type, encoded)
}

/// Mistral OCR provider
pub struct MistralProvider {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl MistralProvider {
    pub fn new(api_url: &str, api_key: &str, model: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }

    pub fn with_api_key(api_key: &str) -> Self {
        Self::new(DEFAULT_MISTRAL_URL, api_key, DEFAULT_MISTRAL_MODEL)
    }

    fn request_body(&self, data: &[u8], mime_type: &str, prompt: &str) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": prompt },
                {
                    "role": "user",
                    "content": [
                        { "type": "image_url", "image_url": { "url": data_uri(data, mime_type) } },
                        { "type": "text", "text": USER_INSTRUCTION }
                    ]
                }
            ]
        })
    }
}

#[async_trait]
impl ExtractionProvider for MistralProvider {
    fn name(&self) -> &'static str {
        "mistral"
    }

    async fn extract(&self, data: &[u8], mime_type: &str, prompt: &str) -> Result<String, OcrError> {
        if self.api_key.trim().is_empty() {
            return Err(OcrError::MissingApiKey);
        }

        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(data, mime_type, prompt))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(OcrError::Api { status, body });
        }

        let result: serde_json::Value = response
            .json()
            .await
            .map_err(|e| OcrError::InvalidResponse(e.to_string()))?;

        let content = result["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| OcrError::InvalidResponse("missing choices[0].message.content".to_string()))?;

        if content.trim().is_empty() {
            return Err(OcrError::EmptyResponse);
        }

        Ok(content.to_string())
    }
}

/// Mock provider for testing
///
/// Echoes the document bytes back as text, optionally after a delay, and
/// records call counts plus the peak number of overlapping calls.
#[cfg(test)]
pub struct MockProvider {
    pub fail: bool,
    pub delay: Option<std::time::Duration>,
    pub calls: std::sync::atomic::AtomicUsize,
    pub active: std::sync::atomic::AtomicUsize,
    pub peak: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockProvider {
    pub fn echo() -> Self {
        Self {
            fail: false,
            delay: None,
            calls: Default::default(),
            active: Default::default(),
            peak: Default::default(),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::echo()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
#[async_trait]
impl ExtractionProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn extract(&self, data: &[u8], _mime_type: &str, _prompt: &str) -> Result<String, OcrError> {
        use std::sync::atomic::Ordering;

        self.calls.fetch_add(1, Ordering::SeqCst);
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now_active, Ordering::SeqCst);

        // Documents may carry their own latency as a leading "sleep:<ms>;" marker.
        let text = String::from_utf8_lossy(data).to_string();
        let delay = text
            .strip_prefix("sleep:")
            .and_then(|rest| rest.split(';').next())
            .and_then(|ms| ms.parse::<u64>().ok())
            .map(std::time::Duration::from_millis)
            .or(self.delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.active.fetch_sub(1, Ordering::SeqCst);

        if self.fail {
            return Err(OcrError::Api {
                status: 503,
                body: "service unavailable".to_string(),
            });
        }
        Ok(text)
    }
}
