//! Processing statistics
//!
//! Counters live for as long as the owning processor; nothing is persisted.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Thread-safe processing counters
#[derive(Debug, Default)]
pub struct StatisticsTracker {
    total_processed: AtomicU64,
    successful: AtomicU64,
    failed: AtomicU64,
    cached: AtomicU64,
}

/// Point-in-time view of the counters
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatisticsSnapshot {
    pub total_processed: u64,
    pub successful: u64,
    pub failed: u64,
    pub cached: u64,
    /// `successful / max(total_processed, 1)` as a percentage
    pub success_rate: f64,
    /// `cached / max(total_processed, 1)` as a percentage
    pub cache_hit_rate: f64,
}

impl StatisticsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extraction succeeded
    pub fn record_success(&self) {
        self.successful.fetch_add(1, Ordering::Relaxed);
        self.total_processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Validation or extraction failed
    pub fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        self.total_processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Result served from cache; does not count towards `total_processed`
    pub fn record_cache_hit(&self) {
        self.cached.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatisticsSnapshot {
        let total_processed = self.total_processed.load(Ordering::Relaxed);
        let successful = self.successful.load(Ordering::Relaxed);
        let failed = self.failed.load(Ordering::Relaxed);
        let cached = self.cached.load(Ordering::Relaxed);
        let denominator = total_processed.max(1) as f64;

        StatisticsSnapshot {
            total_processed,
            successful,
            failed,
            cached,
            success_rate: successful as f64 / denominator * 100.0,
            cache_hit_rate: cached as f64 / denominator * 100.0,
        }
    }
}
