//! Application state management

use std::sync::Arc;

use crate::cache::{CacheError, ResultCache};
use crate::config::{Config, ProviderConfig};
use crate::document::DocumentValidator;
use crate::ocr::{ExtractionProvider, MistralProvider, RetryingExtractionClient};
use crate::processor::DocumentProcessor;

/// Error type for state initialization
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Failed to open result cache: {0}")]
    Cache(#[from] CacheError),
}

/// Provider for the configured Mistral endpoint
///
/// A missing key is not an error here; extraction calls fail with
/// `MissingApiKey` instead so the rest of the service stays usable.
pub fn mistral_provider(config: &ProviderConfig) -> Arc<dyn ExtractionProvider> {
    Arc::new(MistralProvider::new(
        &config.api_url,
        config.api_key.as_deref().unwrap_or_default(),
        &config.model,
    ))
}

/// Wire a processor from configuration and an extraction provider
pub fn build_processor(
    config: &Config,
    provider: Arc<dyn ExtractionProvider>,
) -> Result<DocumentProcessor, StateError> {
    let processing = &config.processing;
    let cache = ResultCache::open(&processing.cache_dir)?;
    let client = RetryingExtractionClient::new(provider, processing.retry_policy());

    Ok(DocumentProcessor::builder(cache, client)
        .validator(DocumentValidator::new(processing.max_file_size))
        .build())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    processor: DocumentProcessor,
}

impl AppState {
    /// Create state backed by the configured Mistral provider
    pub fn new(config: Config) -> Result<Self, StateError> {
        let provider = mistral_provider(&config.provider);
        Self::with_provider(config, provider)
    }

    /// Create state with a caller-supplied provider
    pub fn with_provider(
        config: Config,
        provider: Arc<dyn ExtractionProvider>,
    ) -> Result<Self, StateError> {
        let processor = build_processor(&config, provider)?;

        Ok(Self {
            inner: Arc::new(AppStateInner { config, processor }),
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the document processor
    pub fn processor(&self) -> &DocumentProcessor {
        &self.inner.processor
    }
}
