//! Report Export Module
//!
//! Renders finished batches for people and machines.
//!
//! # Supported Formats
//!
//! - **JSON**: summary plus the full serialized results
//! - **Markdown**: one section per document
//! - **Text**: plain-text equivalent of the Markdown report
//! - **HTML**: standalone page with summary cards
//!
//! # Example
//!
//! ```rust,ignore
//! use docsight::report::{OutputFormat, ReportExporter};
//!
//! let exporter = ReportExporter::new("output");
//! let markdown = exporter.export(&results, OutputFormat::Markdown)?;
//! let (_, path) = exporter
//!     .export_to_file(&results, "html".parse()?, "batch.html")
//!     .await?;
//! ```

mod exporter;
mod formatter;
mod types;

pub use exporter::ReportExporter;
pub use formatter::{
    format_file_size, generate_html, generate_json, generate_markdown, generate_report,
    generate_text,
};
pub use types::{BatchReport, OutputFormat, ReportError, ReportResult};
