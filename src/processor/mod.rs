//! Batch orchestration
//!
//! # Modules
//!
//! - `orchestrator`: per-document pipeline and bounded-concurrency batches
//! - `stats`: process-lifetime counters

mod orchestrator;
mod stats;

pub use orchestrator::{
    ensure_batch_size, AdmissionError, BatchOutcome, DocumentProcessor, ProcessorBuilder,
    DEFAULT_MAX_CONCURRENT, MAX_BATCH_FILES,
};
pub use stats::{StatisticsSnapshot, StatisticsTracker};
