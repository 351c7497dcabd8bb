//! Admission control for incoming documents
//!
//! Checks existence, size and format using filesystem metadata only, so a
//! rejected document never costs a hash or a network call.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Maximum file size: 50MB
pub const MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Supported extensions and their MIME types
pub const SUPPORTED_FORMATS: &[(&str, &str)] = &[
    ("pdf", "application/pdf"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
];

/// Reasons a document is refused before processing
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    #[error("not a regular file: {0}")]
    NotAFile(PathBuf),

    #[error("file too large: {size} bytes (max {max})")]
    TooLarge { size: u64, max: u64 },

    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A document that passed admission
#[derive(Debug, Clone)]
pub struct ValidatedDocument {
    pub path: PathBuf,
    pub file_name: String,
    pub size: u64,
    pub mime_type: &'static str,
}

impl ValidatedDocument {
    pub fn is_pdf(&self) -> bool {
        self.mime_type == "application/pdf"
    }
}

/// Guess a supported MIME type from a file name
///
/// Returns `None` for anything outside [`SUPPORTED_FORMATS`].
pub fn supported_mime_type(name: &str) -> Option<&'static str> {
    let guessed = mime_guess::from_path(name).first()?;
    SUPPORTED_FORMATS
        .iter()
        .map(|(_, mime)| *mime)
        .find(|mime| *mime == guessed.essence_str())
}

/// Whether a declared content type is one we accept
pub fn is_supported_mime(content_type: &str) -> bool {
    SUPPORTED_FORMATS
        .iter()
        .any(|(_, mime)| mime.eq_ignore_ascii_case(content_type.trim()))
}

/// Format and size admission policy
#[derive(Debug, Clone)]
pub struct DocumentValidator {
    max_file_size: u64,
}

impl Default for DocumentValidator {
    fn default() -> Self {
        Self::new(MAX_FILE_SIZE)
    }
}

impl DocumentValidator {
    pub fn new(max_file_size: u64) -> Self {
        Self { max_file_size }
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Validate a document on disk
    pub async fn validate(&self, path: &Path) -> Result<ValidatedDocument, ValidationError> {
        let result = self.check(path).await;
        if let Err(ref e) = result {
            tracing::error!(path = %path.display(), error = %e, "Document rejected");
        }
        result
    }

    /// Boolean form of [`validate`](Self::validate)
    pub async fn is_valid(&self, path: &Path) -> bool {
        self.validate(path).await.is_ok()
    }

    async fn check(&self, path: &Path) -> Result<ValidatedDocument, ValidationError> {
        let metadata = match tokio::fs::metadata(path).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ValidationError::NotFound(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };

        if !metadata.is_file() {
            return Err(ValidationError::NotAFile(path.to_path_buf()));
        }

        if metadata.len() > self.max_file_size {
            return Err(ValidationError::TooLarge {
                size: metadata.len(),
                max: self.max_file_size,
            });
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let mime_type = supported_mime_type(&file_name).ok_or_else(|| {
            let guessed = mime_guess::from_path(path)
                .first_raw()
                .unwrap_or("unknown");
            ValidationError::UnsupportedFormat(format!("{} ({})", file_name, guessed))
        })?;

        Ok(ValidatedDocument {
            path: path.to_path_buf(),
            file_name,
            size: metadata.len(),
            mime_type,
        })
    }
}
