//! Docsight Library
//!
//! Document text extraction through an external OCR provider, with a
//! content-addressed result cache and bounded-concurrency batches.
//! The binary in main.rs wraps this in a CLI and an HTTP server.
//!
//! # Modules
//!
//! - `document`: document model and validation
//! - `cache`: SHA-256 keyed result cache
//! - `ocr`: provider client, retries, language and page-count helpers
//! - `processor`: per-document pipeline, batches and statistics
//! - `report`: JSON / Markdown / text / HTML export
//! - `routes`: axum HTTP surface

pub mod cache;
pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod ocr;
pub mod processor;
pub mod report;
pub mod routes;
pub mod state;
