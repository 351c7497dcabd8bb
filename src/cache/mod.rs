//! Content-addressed result cache
//!
//! Stores one JSON-encoded [`ProcessingResult`] per SHA-256 digest:
//!
//! ```text
//! <cache_dir>/<sha256-hex>.json
//! ```
//!
//! Entries are written to a temporary file in the same directory and renamed
//! into place, so concurrent readers see either nothing or a complete entry.
//! Read failures and corrupt entries degrade to a cache miss.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::io::AsyncReadExt;

use crate::document::ProcessingResult;

/// Read buffer size used while hashing
const HASH_CHUNK_SIZE: usize = 64 * 1024;

const ENTRY_EXTENSION: &str = "json";

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("refusing to cache non-terminal status: {0}")]
    NonTerminalStatus(String),
}

/// Compute the SHA-256 hex digest of an in-memory buffer
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Compute the SHA-256 hex digest of a file, streaming it in fixed chunks
pub async fn hash_file(path: &Path) -> std::io::Result<String> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; HASH_CHUNK_SIZE];

    loop {
        let read = file.read(&mut buffer).await?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Filesystem-backed result cache keyed by content digest
#[derive(Debug, Clone)]
pub struct ResultCache {
    dir: PathBuf,
}

impl ResultCache {
    /// Open (and create if needed) a cache directory
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the entry for a digest
    pub fn entry_path(&self, digest: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", digest, ENTRY_EXTENSION))
    }

    /// Look up a previously stored result
    ///
    /// Never fails: unreadable or corrupt entries are logged and reported as
    /// a miss.
    pub async fn lookup(&self, digest: &str) -> Option<ProcessingResult> {
        let path = self.entry_path(digest);

        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(digest = %digest, error = %e, "Failed to read cache entry");
                return None;
            }
        };

        match serde_json::from_str::<ProcessingResult>(&raw) {
            Ok(result) => {
                tracing::debug!(digest = %digest, "Cache hit");
                Some(result)
            }
            Err(e) => {
                tracing::warn!(digest = %digest, error = %e, "Corrupt cache entry, ignoring");
                None
            }
        }
    }

    /// Persist a result under its digest
    pub async fn store(&self, digest: &str, result: &ProcessingResult) -> Result<(), CacheError> {
        if !result.status.is_terminal() {
            return Err(CacheError::NonTerminalStatus(result.status.to_string()));
        }

        let json = serde_json::to_string_pretty(result)?;
        let final_path = self.entry_path(digest);
        let tmp_path = self
            .dir
            .join(format!(".{}.{}.tmp", digest, uuid::Uuid::new_v4()));

        if let Err(e) = tokio::fs::write(&tmp_path, json.as_bytes()).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }

        if let Err(e) = tokio::fs::rename(&tmp_path, &final_path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }

        tracing::debug!(digest = %digest, path = %final_path.display(), "Stored cache entry");
        Ok(())
    }

    /// Remove entries whose last modification is older than `max_age_days`
    ///
    /// Returns the number of entries removed.
    pub async fn evict(&self, max_age_days: u64) -> Result<usize, CacheError> {
        let max_age = Duration::from_secs(max_age_days.saturating_mul(SECONDS_PER_DAY));
        let cutoff = SystemTime::now()
            .checked_sub(max_age)
            .unwrap_or(SystemTime::UNIX_EPOCH);

        let mut removed = 0;
        let mut entries = tokio::fs::read_dir(&self.dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(ENTRY_EXTENSION) {
                continue;
            }

            let modified = match entry.metadata().await.and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Cannot stat cache entry");
                    continue;
                }
            };

            if modified >= cutoff {
                continue;
            }

            match tokio::fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                // Another sweep got there first.
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Cannot remove cache entry");
                }
            }
        }

        tracing::info!(
            removed = removed,
            max_age_days = max_age_days,
            "Evicted stale cache entries"
        );

        Ok(removed)
    }

    /// Number of entries currently on disk
    pub async fn entry_count(&self) -> Result<usize, CacheError> {
        let mut count = 0;
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.path().extension().and_then(|e| e.to_str()) == Some(ENTRY_EXTENSION) {
                count += 1;
            }
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{
        DocumentMetadata, ExtractionResult, ProcessingOptions, ProcessingStatus,
    };
    use tempfile::TempDir;

    fn sample_result(text: &str) -> ProcessingResult {
        ProcessingResult::completed(
            DocumentMetadata::new("a.pdf", 4, "application/pdf", hash_bytes(text.as_bytes())),
            ExtractionResult {
                text: text.to_string(),
                confidence: Some(0.95),
                ..Default::default()
            },
            ProcessingOptions::default(),
        )
    }

    fn age_file(path: &Path, days: u64) {
        let file = std::fs::File::options().write(true).open(path).unwrap();
        let when = SystemTime::now() - Duration::from_secs(days * SECONDS_PER_DAY);
        file.set_modified(when).unwrap();
    }

    #[test]
    fn test_hash_bytes_is_stable() {
        let a = hash_bytes(b"Hello, World!");
        let b = hash_bytes(b"Hello, World!");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, hash_bytes(b"Hello, World?"));
    }

    #[tokio::test]
    async fn test_hash_file_matches_hash_bytes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("big.bin");
        // Larger than one read chunk so the streaming path loops.
        let data: Vec<u8> = (0..(HASH_CHUNK_SIZE * 3 + 17)).map(|i| (i % 251) as u8).collect();
        std::fs::write(&path, &data).unwrap();

        assert_eq!(hash_file(&path).await.unwrap(), hash_bytes(&data));
    }

    #[tokio::test]
    async fn test_store_then_lookup() {
        let dir = TempDir::new().unwrap();
        let cache = ResultCache::open(dir.path().join("cache")).unwrap();
        let result = sample_result("extracted");

        assert!(cache.lookup("abc").await.is_none());
        cache.store("abc", &result).await.unwrap();

        let loaded = cache.lookup("abc").await.unwrap();
        assert_eq!(loaded, result);
        assert_eq!(cache.entry_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_a_miss() {
        let dir = TempDir::new().unwrap();
        let cache = ResultCache::open(dir.path()).unwrap();
        std::fs::write(cache.entry_path("deadbeef"), "{ not json").unwrap();

        assert!(cache.lookup("deadbeef").await.is_none());
    }

    #[tokio::test]
    async fn test_refuses_transient_status() {
        let dir = TempDir::new().unwrap();
        let cache = ResultCache::open(dir.path()).unwrap();
        let mut result = sample_result("x");
        result.status = ProcessingStatus::Processing;

        let err = cache.store("abc", &result).await.unwrap_err();
        assert!(matches!(err, CacheError::NonTerminalStatus(_)));
        assert!(!cache.entry_path("abc").exists());
    }

    #[tokio::test]
    async fn test_store_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let cache = ResultCache::open(dir.path()).unwrap();
        cache.store("one", &sample_result("1")).await.unwrap();
        cache.store("one", &sample_result("2")).await.unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["one.json".to_string()]);
        assert_eq!(cache.lookup("one").await.unwrap().ocr_result.text, "2");
    }

    #[tokio::test]
    async fn test_evict_removes_only_old_entries() {
        let dir = TempDir::new().unwrap();
        let cache = ResultCache::open(dir.path()).unwrap();
        cache.store("old", &sample_result("old")).await.unwrap();
        cache.store("fresh", &sample_result("fresh")).await.unwrap();
        std::fs::write(dir.path().join("notes.txt"), "keep me").unwrap();

        age_file(&cache.entry_path("old"), 40);
        age_file(&dir.path().join("notes.txt"), 40);

        let removed = cache.evict(30).await.unwrap();
        assert_eq!(removed, 1);
        assert!(cache.lookup("old").await.is_none());
        assert!(cache.lookup("fresh").await.is_some());
        assert!(dir.path().join("notes.txt").exists());
    }

    #[tokio::test]
    async fn test_evict_skips_entries_it_cannot_remove() {
        let dir = TempDir::new().unwrap();
        let cache = ResultCache::open(dir.path()).unwrap();
        for digest in ["a", "b", "c", "d"] {
            cache.store(digest, &sample_result(digest)).await.unwrap();
            age_file(&cache.entry_path(digest), 40);
        }
        let stuck = dir.path().join("bad.json");
        std::fs::create_dir(&stuck).unwrap();
        std::fs::File::open(&stuck)
            .unwrap()
            .set_modified(SystemTime::now() - Duration::from_secs(40 * SECONDS_PER_DAY))
            .unwrap();

        let removed = cache.evict(30).await.unwrap();

        assert_eq!(removed, 4);
        for digest in ["a", "b", "c", "d"] {
            assert!(!cache.entry_path(digest).exists());
        }
        assert!(stuck.is_dir());

        // The stuck entry does not poison later sweeps.
        assert_eq!(cache.evict(30).await.unwrap(), 0);
    }
}
