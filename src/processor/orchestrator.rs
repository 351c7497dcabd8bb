//! Document processing pipeline
//!
//! Runs the per-document state machine (validate → hash → cache lookup →
//! extract → detect language → cache store) and fans it out over a batch
//! under a concurrency cap.
//!
//! # Design
//!
//! ```text
//! process_batch(paths)
//!     │  one tokio task per path
//!     ▼
//! ┌────────────────────────────┐
//! │  Semaphore(max_concurrent) │  ← tasks wait here for a slot
//! └────────────────────────────┘
//!     │
//!     ▼
//! process_one(path) ──► ProcessingResult
//!     │
//!     ▼
//! results buffered by input index
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::Semaphore;

use crate::cache::{self, CacheError, ResultCache};
use crate::document::{
    DocumentMetadata, DocumentValidator, ExtractionResult, ProcessingOptions, ProcessingResult,
};
use crate::ocr::{
    detect_or_unknown, LanguageDetector, LopdfPageCounter, PageCounter, RetryingExtractionClient,
    ScriptLanguageDetector,
};

use super::stats::{StatisticsSnapshot, StatisticsTracker};

/// Maximum number of documents accepted by a single batch submission
pub const MAX_BATCH_FILES: usize = 10;

/// Default number of pipelines allowed in flight at once
pub const DEFAULT_MAX_CONCURRENT: usize = 3;

/// Confidence attached to successful provider output
const PROVIDER_CONFIDENCE: f64 = 0.95;

/// Batch-level precondition failures
#[derive(Debug, Error)]
pub enum AdmissionError {
    #[error("Maximum {max} files allowed per batch, got {count}")]
    TooManyFiles { count: usize, max: usize },
}

/// Results of a batch plus the statistics after it finished
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub results: Vec<ProcessingResult>,
    pub statistics: StatisticsSnapshot,
}

/// Reject batches larger than [`MAX_BATCH_FILES`]
pub fn ensure_batch_size(count: usize) -> Result<(), AdmissionError> {
    if count > MAX_BATCH_FILES {
        return Err(AdmissionError::TooManyFiles {
            count,
            max: MAX_BATCH_FILES,
        });
    }
    Ok(())
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Builder for [`DocumentProcessor`]
pub struct ProcessorBuilder {
    cache: ResultCache,
    client: RetryingExtractionClient,
    validator: DocumentValidator,
    language: Arc<dyn LanguageDetector>,
    pages: Arc<dyn PageCounter>,
    stats: Arc<StatisticsTracker>,
}

impl ProcessorBuilder {
    pub fn validator(mut self, validator: DocumentValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn language_detector(mut self, detector: Arc<dyn LanguageDetector>) -> Self {
        self.language = detector;
        self
    }

    pub fn page_counter(mut self, counter: Arc<dyn PageCounter>) -> Self {
        self.pages = counter;
        self
    }

    pub fn statistics(mut self, stats: Arc<StatisticsTracker>) -> Self {
        self.stats = stats;
        self
    }

    pub fn build(self) -> DocumentProcessor {
        DocumentProcessor {
            inner: Arc::new(ProcessorInner {
                cache: self.cache,
                client: self.client,
                validator: self.validator,
                language: self.language,
                pages: self.pages,
                stats: self.stats,
            }),
        }
    }
}

/// Orchestrates validation, caching and extraction for documents
#[derive(Clone)]
pub struct DocumentProcessor {
    inner: Arc<ProcessorInner>,
}

struct ProcessorInner {
    cache: ResultCache,
    client: RetryingExtractionClient,
    validator: DocumentValidator,
    language: Arc<dyn LanguageDetector>,
    pages: Arc<dyn PageCounter>,
    stats: Arc<StatisticsTracker>,
}

impl DocumentProcessor {
    pub fn builder(cache: ResultCache, client: RetryingExtractionClient) -> ProcessorBuilder {
        ProcessorBuilder {
            cache,
            client,
            validator: DocumentValidator::default(),
            language: Arc::new(ScriptLanguageDetector),
            pages: Arc::new(LopdfPageCounter),
            stats: Arc::new(StatisticsTracker::new()),
        }
    }

    pub fn new(cache: ResultCache, client: RetryingExtractionClient) -> Self {
        Self::builder(cache, client).build()
    }

    pub fn cache(&self) -> &ResultCache {
        &self.inner.cache
    }

    pub fn statistics(&self) -> StatisticsSnapshot {
        self.inner.stats.snapshot()
    }

    /// Remove cache entries older than `max_age_days`
    pub async fn clear_cache(&self, max_age_days: u64) -> Result<usize, CacheError> {
        self.inner.cache.evict(max_age_days).await
    }

    /// Process a single document
    ///
    /// Always returns a result; failures are reported through the `failed`
    /// status and `error_message`.
    pub async fn process_one(
        &self,
        path: &Path,
        options: &ProcessingOptions,
        use_cache: bool,
    ) -> ProcessingResult {
        let started = Instant::now();
        let stats = &self.inner.stats;

        tracing::info!(path = %path.display(), "Processing file");

        let doc = match self.inner.validator.validate(path).await {
            Ok(doc) => doc,
            Err(e) => {
                stats.record_failure();
                return ProcessingResult::failed(
                    DocumentMetadata::unknown(file_name_of(path)),
                    format!("validation failed: {}", e),
                    *options,
                );
            }
        };

        let digest = match cache::hash_file(&doc.path).await {
            Ok(digest) => digest,
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Failed to hash file");
                stats.record_failure();
                return ProcessingResult::failed(
                    DocumentMetadata::new(&doc.file_name, doc.size, doc.mime_type, ""),
                    format!("failed to read file: {}", e),
                    *options,
                );
            }
        };

        if use_cache {
            if let Some(cached) = self.inner.cache.lookup(&digest).await {
                tracing::info!(path = %path.display(), digest = %digest, "Loaded cached result");
                stats.record_cache_hit();
                return cached.into_cached();
            }
        }

        let mut metadata = DocumentMetadata::new(&doc.file_name, doc.size, doc.mime_type, &digest);
        if doc.is_pdf() {
            metadata.page_count = self.page_count(&doc.path).await;
        }

        let outcome = match tokio::fs::read(&doc.path).await {
            Ok(data) => self
                .inner
                .client
                .extract(&data, doc.mime_type, options)
                .await
                .map_err(|e| e.to_string()),
            Err(e) => Err(format!("failed to read file: {}", e)),
        };

        match outcome {
            Ok(text) => {
                let language = detect_or_unknown(self.inner.language.as_ref(), &text);
                let elapsed = started.elapsed().as_secs_f64();
                metadata.language = Some(language.clone());
                metadata.processing_time = Some(elapsed);

                let result = ProcessingResult::completed(
                    metadata,
                    ExtractionResult {
                        text,
                        confidence: Some(PROVIDER_CONFIDENCE),
                        language: Some(language),
                        ..Default::default()
                    },
                    *options,
                );

                if use_cache {
                    match self.inner.cache.store(&digest, &result).await {
                        Ok(()) => tracing::info!(path = %path.display(), "Cached result"),
                        Err(e) => tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "Failed to cache result"
                        ),
                    }
                }

                stats.record_success();
                tracing::info!(
                    path = %path.display(),
                    elapsed_secs = elapsed,
                    "Successfully processed"
                );
                result
            }
            Err(message) => {
                tracing::error!(path = %path.display(), error = %message, "Failed to process");
                metadata.processing_time = Some(started.elapsed().as_secs_f64());
                stats.record_failure();
                ProcessingResult::failed(metadata, message, *options)
            }
        }
    }

    /// Process many documents concurrently, returning results in input order
    pub async fn process_batch(
        &self,
        paths: &[PathBuf],
        options: &ProcessingOptions,
        max_concurrent: usize,
    ) -> Vec<ProcessingResult> {
        self.process_batch_with_cache(paths, options, max_concurrent, true)
            .await
    }

    /// [`process_batch`](Self::process_batch) with explicit cache control
    pub async fn process_batch_with_cache(
        &self,
        paths: &[PathBuf],
        options: &ProcessingOptions,
        max_concurrent: usize,
        use_cache: bool,
    ) -> Vec<ProcessingResult> {
        let permits = max_concurrent.max(1);
        tracing::info!(
            count = paths.len(),
            max_concurrent = permits,
            "Starting batch processing"
        );

        let semaphore = Arc::new(Semaphore::new(permits));
        let handles: Vec<_> = paths
            .iter()
            .cloned()
            .map(|path| {
                let processor = self.clone();
                let semaphore = semaphore.clone();
                let options = *options;
                tokio::spawn(async move {
                    let _permit = match semaphore.acquire_owned().await {
                        Ok(permit) => permit,
                        Err(e) => {
                            return ProcessingResult::failed(
                                DocumentMetadata::unknown(file_name_of(&path)),
                                e.to_string(),
                                options,
                            )
                        }
                    };
                    processor.process_one(&path, &options, use_cache).await
                })
            })
            .collect();

        let joined = futures::future::join_all(handles).await;

        let results: Vec<ProcessingResult> = joined
            .into_iter()
            .zip(paths)
            .map(|(joined, path)| match joined {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!(path = %path.display(), error = %e, "Exception processing file");
                    ProcessingResult::failed(
                        DocumentMetadata::unknown(file_name_of(path)),
                        e.to_string(),
                        *options,
                    )
                }
            })
            .collect();

        let stats = self.statistics();
        tracing::info!(
            successful = stats.successful,
            failed = stats.failed,
            cached = stats.cached,
            "Batch processing completed"
        );

        results
    }

    /// Service entry point for batches: admission check, then processing
    pub async fn submit_batch(
        &self,
        paths: &[PathBuf],
        options: &ProcessingOptions,
        max_concurrent: usize,
        use_cache: bool,
    ) -> Result<BatchOutcome, AdmissionError> {
        ensure_batch_size(paths.len())?;

        let results = self
            .process_batch_with_cache(paths, options, max_concurrent, use_cache)
            .await;

        Ok(BatchOutcome {
            results,
            statistics: self.statistics(),
        })
    }

    async fn page_count(&self, path: &Path) -> Option<u32> {
        let pages = self.inner.pages.clone();
        let path = path.to_path_buf();
        match tokio::task::spawn_blocking(move || pages.page_count(&path)).await {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!(error = %e, "Page counting task failed");
                None
            }
        }
    }
}
