//! Report types

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::document::{ProcessingResult, ProcessingStatus};

/// Report output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Markdown,
    Txt,
    Html,
}

impl OutputFormat {
    /// File extension used when writing reports to disk
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Markdown => "md",
            Self::Txt => "txt",
            Self::Html => "html",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Markdown => write!(f, "markdown"),
            Self::Txt => write!(f, "txt"),
            Self::Html => write!(f, "html"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "markdown" | "md" => Ok(Self::Markdown),
            "txt" | "text" => Ok(Self::Txt),
            "html" | "htm" => Ok(Self::Html),
            _ => Err(ReportError::InvalidFormat(s.to_string())),
        }
    }
}

/// Summary plus per-document results of a finished batch
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport<'a> {
    pub timestamp: DateTime<Utc>,
    pub total_files: usize,
    /// Completed or served from cache
    pub successful: usize,
    pub failed: usize,
    pub cached: usize,
    pub results: &'a [ProcessingResult],
}

impl<'a> BatchReport<'a> {
    pub fn new(results: &'a [ProcessingResult]) -> Self {
        let count = |status: ProcessingStatus| results.iter().filter(|r| r.status == status).count();
        let cached = count(ProcessingStatus::Cached);

        Self {
            timestamp: Utc::now(),
            total_files: results.len(),
            successful: count(ProcessingStatus::Completed) + cached,
            failed: count(ProcessingStatus::Failed),
            cached,
            results,
        }
    }

    /// Percentage of documents that produced text
    pub fn success_rate(&self) -> f64 {
        if self.total_files == 0 {
            return 0.0;
        }
        self.successful as f64 / self.total_files as f64 * 100.0
    }
}

/// Report errors
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Invalid output format: {0}")]
    InvalidFormat(String),

    #[error("Invalid report file name: {0}")]
    InvalidFileName(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to write report to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for report operations
pub type ReportResult<T> = Result<T, ReportError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentMetadata, ExtractionResult, ProcessingOptions};

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("MD".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Txt);
        assert_eq!("htm".parse::<OutputFormat>().unwrap(), OutputFormat::Html);
        assert!("pdf".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_cached_results_count_as_successful() {
        let options = ProcessingOptions::default();
        let done = ProcessingResult::completed(
            DocumentMetadata::new("a.png", 1, "image/png", "h"),
            ExtractionResult::empty(),
            options,
        );
        let results = vec![
            done.clone(),
            done.into_cached(),
            ProcessingResult::failed(DocumentMetadata::unknown("b.docx"), "nope", options),
        ];

        let report = BatchReport::new(&results);
        assert_eq!(report.total_files, 3);
        assert_eq!(report.successful, 2);
        assert_eq!(report.cached, 1);
        assert_eq!(report.failed, 1);
        assert!((report.success_rate() - 66.666).abs() < 0.01);
        assert_eq!(BatchReport::new(&[]).success_rate(), 0.0);
    }
}
