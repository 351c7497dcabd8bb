//! Retrying extraction client
//!
//! Wraps a single [`ExtractionProvider`] call with a bounded number of
//! attempts and a linear backoff between them.

use std::sync::Arc;
use std::time::Duration;

use crate::document::ProcessingOptions;

use super::provider::ExtractionProvider;
use super::types::OcrError;

/// Default number of attempts (first call included)
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

/// Default base delay between attempts
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

const BASE_INSTRUCTIONS: &[&str] = &[
    "Extract ALL text from the document, keeping its original structure.",
    "Preserve headers, paragraphs, lists and table structures.",
    "For Arabic text, take care with diacritics, right-to-left reading order and character shapes.",
    "For mixed-language documents, clearly separate the sections written in each language.",
    "Return the result as clean, well-structured Markdown.",
    "If images are present, give a short description of their content.",
];

/// Retry budget and backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay unit; the wait after attempt `n` is `base_delay * n`
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_RETRY_ATTEMPTS,
            base_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Wait before the attempt following failed attempt `attempt` (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }
}

/// Build the directive sent to the provider for a set of options
pub fn build_prompt(options: &ProcessingOptions) -> String {
    let mut instructions: Vec<&str> = BASE_INSTRUCTIONS.to_vec();

    if options.extract_images {
        instructions.push("Extract and describe any images, charts, diagrams or other visual elements.");
    }
    if options.preserve_formatting {
        instructions.push("Keep the original document formatting in the Markdown as far as possible.");
    }
    if options.extract_tables {
        instructions.push("Convert every table to a proper Markdown table.");
    }
    if options.auto_translate {
        instructions.push("Provide an English translation alongside any Arabic text.");
    }

    let mut prompt = String::from(
        "You are an OCR system specialised in multilingual documents, in particular Arabic and English. \
         Extract and structure the text of the document with high accuracy.\n\nInstructions:",
    );
    for (i, instruction) in instructions.iter().enumerate() {
        prompt.push_str(&format!("\n{}. {}", i + 1, instruction));
    }
    prompt.push_str(
        "\n\nBe exact with Arabic text recognition and keep the meaning and structure of the original.",
    );
    prompt
}

/// Provider call with bounded retries
#[derive(Clone)]
pub struct RetryingExtractionClient {
    provider: Arc<dyn ExtractionProvider>,
    policy: RetryPolicy,
}

impl RetryingExtractionClient {
    pub fn new(provider: Arc<dyn ExtractionProvider>, policy: RetryPolicy) -> Self {
        Self { provider, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Extract text, retrying every failure until the budget runs out
    ///
    /// The last provider error is returned unchanged once all attempts fail.
    pub async fn extract(
        &self,
        data: &[u8],
        mime_type: &str,
        options: &ProcessingOptions,
    ) -> Result<String, OcrError> {
        let prompt = build_prompt(options);
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            tracing::info!(
                provider = self.provider.name(),
                attempt = attempt,
                max_attempts = max_attempts,
                "Calling extraction provider"
            );

            match self.provider.extract(data, mime_type, &prompt).await {
                Ok(text) => return Ok(text),
                Err(e) if attempt < max_attempts => {
                    let delay = self.policy.delay_after(attempt);
                    tracing::warn!(
                        provider = self.provider.name(),
                        attempt = attempt,
                        error = %e,
                        retry_in_ms = delay.as_millis() as u64,
                        "Extraction attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(
                        provider = self.provider.name(),
                        attempts = attempt,
                        error = %e,
                        "Extraction failed after all attempts"
                    );
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::provider::MockProvider;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails a fixed number of times, then succeeds
    struct FlakyProvider {
        failures: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ExtractionProvider for FlakyProvider {
        fn name(&self) -> &'static str {
            "flaky"
        }

        async fn extract(&self, _data: &[u8], _mime: &str, _prompt: &str) -> Result<String, OcrError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(OcrError::Request(format!("timeout #{}", call + 1)))
            } else {
                Ok("recovered".to_string())
            }
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_millis(1))
    }

    #[test]
    fn test_linear_backoff() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(1), Duration::from_secs(2));
        assert_eq!(policy.delay_after(2), Duration::from_secs(4));
    }

    #[test]
    fn test_prompt_follows_options() {
        let all = ProcessingOptions {
            extract_images: true,
            preserve_formatting: true,
            extract_tables: true,
            auto_translate: true,
        };
        let none = ProcessingOptions {
            extract_images: false,
            preserve_formatting: false,
            extract_tables: false,
            auto_translate: false,
        };

        let full = build_prompt(&all);
        assert!(full.contains("describe any images"));
        assert!(full.contains("Markdown table"));
        assert!(full.contains("English translation"));
        assert!(full.contains("\n10. "));

        let bare = build_prompt(&none);
        assert!(!bare.contains("Markdown table"));
        assert!(!bare.contains("English translation"));
        assert!(bare.contains("\n6. "));
        assert!(!bare.contains("\n7. "));
    }

    #[tokio::test]
    async fn test_exhausts_exactly_three_attempts() {
        let provider = Arc::new(MockProvider::failing());
        let client = RetryingExtractionClient::new(provider.clone(), fast_policy());

        let result = client
            .extract(b"data", "image/png", &ProcessingOptions::default())
            .await;

        assert!(matches!(result, Err(OcrError::Api { status: 503, .. })));
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_linearly_between_attempts() {
        let provider = Arc::new(MockProvider::failing());
        let client = RetryingExtractionClient::new(
            provider.clone(),
            RetryPolicy::new(3, Duration::from_secs(2)),
        );
        let started = tokio::time::Instant::now();

        let result = client
            .extract(b"data", "image/png", &ProcessingOptions::default())
            .await;

        assert!(result.is_err());
        assert_eq!(provider.call_count(), 3);
        // 2s after the first failure, 4s after the second, nothing after the last.
        assert_eq!(started.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_attempt_never_sleeps() {
        let provider = Arc::new(MockProvider::failing());
        let client = RetryingExtractionClient::new(
            provider.clone(),
            RetryPolicy::new(1, Duration::from_secs(2)),
        );
        let started = tokio::time::Instant::now();

        let result = client
            .extract(b"data", "image/png", &ProcessingOptions::default())
            .await;

        assert!(result.is_err());
        assert_eq!(provider.call_count(), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failures() {
        let provider = Arc::new(FlakyProvider {
            failures: 2,
            calls: AtomicUsize::new(0),
        });
        let client = RetryingExtractionClient::new(provider.clone(), fast_policy());

        let text = client
            .extract(b"data", "image/png", &ProcessingOptions::default())
            .await
            .unwrap();

        assert_eq!(text, "recovered");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_last_error_is_preserved() {
        let provider = Arc::new(FlakyProvider {
            failures: 10,
            calls: AtomicUsize::new(0),
        });
        let client = RetryingExtractionClient::new(provider, fast_policy());

        let err = client
            .extract(b"data", "image/png", &ProcessingOptions::default())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Request failed: timeout #3");
    }

    #[tokio::test]
    async fn test_zero_attempts_still_calls_once() {
        let provider = Arc::new(MockProvider::echo());
        let client = RetryingExtractionClient::new(
            provider.clone(),
            RetryPolicy::new(0, Duration::from_millis(1)),
        );

        let text = client
            .extract(b"hello", "image/png", &ProcessingOptions::default())
            .await
            .unwrap();
        assert_eq!(text, "hello");
        assert_eq!(provider.call_count(), 1);
    }
}
