//! Document model and admission control
//!
//! # Modules
//!
//! - `types`: metadata, extraction output and the per-document result
//! - `validator`: size/format checks performed before any expensive work

mod types;
mod validator;

pub use types::{
    DocumentMetadata, ExtractionResult, ProcessingOptions, ProcessingResult, ProcessingStatus,
};
pub use validator::{
    is_supported_mime, supported_mime_type, DocumentValidator, ValidatedDocument,
    ValidationError, MAX_FILE_SIZE, SUPPORTED_FORMATS,
};
