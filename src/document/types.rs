//! Document types
//!
//! Data model shared by the validator, cache, orchestrator and report exporter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a single document
///
/// `Pending` and `Processing` only ever exist in memory. Stored and exported
/// results are always `Completed`, `Failed` or `Cached`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cached,
}

impl ProcessingStatus {
    /// Whether no further transition can happen from this status
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cached)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cached => "cached",
        }
    }
}

impl std::fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recognized extraction flags
///
/// Each flag appends one instruction to the directive sent to the provider.
/// Unknown keys are rejected when deserializing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingOptions {
    /// Describe images, charts and diagrams
    pub extract_images: bool,
    /// Keep the original layout in the Markdown output
    pub preserve_formatting: bool,
    /// Render tables as Markdown tables
    pub extract_tables: bool,
    /// Add an English translation next to non-English text
    pub auto_translate: bool,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            extract_images: false,
            preserve_formatting: true,
            extract_tables: true,
            auto_translate: false,
        }
    }
}

/// Metadata about a processed document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// File name without directory
    pub file_name: String,
    /// Size in bytes
    pub file_size: u64,
    /// MIME type guessed from the file name
    pub file_type: String,
    /// Lowercase hex SHA-256 of the content
    pub file_hash: String,
    /// Detected language code, filled after extraction
    #[serde(default)]
    pub language: Option<String>,
    /// Number of pages (PDF only)
    #[serde(default)]
    pub page_count: Option<u32>,
    /// Wall-clock processing time in seconds
    #[serde(default)]
    pub processing_time: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl DocumentMetadata {
    pub fn new(
        file_name: impl Into<String>,
        file_size: u64,
        file_type: impl Into<String>,
        file_hash: impl Into<String>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            file_size,
            file_type: file_type.into(),
            file_hash: file_hash.into(),
            language: None,
            page_count: None,
            processing_time: None,
            created_at: Utc::now(),
        }
    }

    /// Placeholder metadata for a document that never got past admission
    pub fn unknown(file_name: impl Into<String>) -> Self {
        Self::new(file_name, 0, "unknown", "")
    }
}

/// Output of the extraction provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Extracted text (empty on failure)
    pub text: String,
    /// Provider-reported confidence (0-1)
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub tables: Vec<serde_json::Value>,
    #[serde(default)]
    pub structure: serde_json::Map<String, serde_json::Value>,
}

impl ExtractionResult {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Complete result for one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub metadata: DocumentMetadata,
    pub ocr_result: ExtractionResult,
    pub status: ProcessingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default)]
    pub processing_options: ProcessingOptions,
}

impl ProcessingResult {
    /// Successful extraction
    pub fn completed(
        metadata: DocumentMetadata,
        ocr_result: ExtractionResult,
        options: ProcessingOptions,
    ) -> Self {
        Self {
            metadata,
            ocr_result,
            status: ProcessingStatus::Completed,
            error_message: None,
            processing_options: options,
        }
    }

    /// Failed document; the extracted text is always empty
    pub fn failed(
        metadata: DocumentMetadata,
        error: impl Into<String>,
        options: ProcessingOptions,
    ) -> Self {
        Self {
            metadata,
            ocr_result: ExtractionResult::empty(),
            status: ProcessingStatus::Failed,
            error_message: Some(error.into()),
            processing_options: options,
        }
    }

    /// Re-label a stored result as served from cache
    pub fn into_cached(mut self) -> Self {
        self.status = ProcessingStatus::Cached;
        self.error_message = None;
        self
    }

    pub fn is_success(&self) -> bool {
        matches!(
            self.status,
            ProcessingStatus::Completed | ProcessingStatus::Cached
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_result_has_empty_text_and_error() {
        let result = ProcessingResult::failed(
            DocumentMetadata::unknown("scan.png"),
            "boom",
            ProcessingOptions::default(),
        );

        assert_eq!(result.status, ProcessingStatus::Failed);
        assert!(result.ocr_result.text.is_empty());
        assert_eq!(result.error_message.as_deref(), Some("boom"));
        assert!(!result.is_success());
    }

    #[test]
    fn test_into_cached_clears_error() {
        let mut result = ProcessingResult::completed(
            DocumentMetadata::new("a.pdf", 10, "application/pdf", "abc"),
            ExtractionResult {
                text: "hello".to_string(),
                ..Default::default()
            },
            ProcessingOptions::default(),
        );
        result.error_message = Some("stale".to_string());

        let cached = result.into_cached();
        assert_eq!(cached.status, ProcessingStatus::Cached);
        assert!(cached.error_message.is_none());
        assert_eq!(cached.ocr_result.text, "hello");
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&ProcessingStatus::Cached).unwrap();
        assert_eq!(json, "\"cached\"");
        assert!(ProcessingStatus::Failed.is_terminal());
        assert!(!ProcessingStatus::Processing.is_terminal());
    }

    #[test]
    fn test_options_reject_unknown_keys() {
        let parsed: Result<ProcessingOptions, _> =
            serde_json::from_str(r#"{"extract_images": true, "ocr_mode": "fast"}"#);
        assert!(parsed.is_err());

        let parsed: ProcessingOptions =
            serde_json::from_str(r#"{"extract_images": true}"#).unwrap();
        assert!(parsed.extract_images);
        assert!(parsed.preserve_formatting);
        assert!(parsed.extract_tables);
        assert!(!parsed.auto_translate);
    }

    #[test]
    fn test_extraction_containers_default_when_missing() {
        let parsed: ExtractionResult = serde_json::from_str(r#"{"text": "x"}"#).unwrap();
        assert!(parsed.images.is_empty());
        assert!(parsed.tables.is_empty());
        assert!(parsed.structure.is_empty());
    }
}
