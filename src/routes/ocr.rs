//! Document extraction endpoints
//!
//! Uploads are staged under a per-request temporary directory as
//! `{dir}/{index}/{file_name}` so the processor sees the client's file name
//! and duplicate names never collide. The directory is removed when the
//! request completes.

use std::path::{Path, PathBuf};

use axum::{
    extract::{multipart::Field, DefaultBodyLimit, Multipart, Query, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

use crate::document::{
    is_supported_mime, supported_mime_type, ProcessingOptions, ProcessingResult,
};
use crate::error::{AppError, Result};
use crate::processor::{ensure_batch_size, StatisticsSnapshot, MAX_BATCH_FILES};
use crate::state::AppState;

/// Multipart overhead allowed on top of the file payloads
const BODY_SLACK: usize = 1024 * 1024;

/// Request body cap for a full batch of files at `max_file_size` each
pub fn body_limit(max_file_size: u64) -> usize {
    let limit = (MAX_BATCH_FILES as u64)
        .saturating_mul(max_file_size)
        .saturating_add(BODY_SLACK as u64);
    usize::try_from(limit).unwrap_or(usize::MAX)
}

pub fn router(max_file_size: u64) -> Router<AppState> {
    Router::new()
        .route("/process", post(process_document))
        .route("/batch", post(process_batch))
        .layer(DefaultBodyLimit::max(body_limit(max_file_size)))
}

/// Query flags accepted by `/process`
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProcessQuery {
    extract_images: Option<bool>,
    preserve_formatting: Option<bool>,
    extract_tables: Option<bool>,
    auto_translate: Option<bool>,
    use_cache: Option<bool>,
}

/// Query flags accepted by `/batch`
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchQuery {
    extract_images: Option<bool>,
    preserve_formatting: Option<bool>,
    extract_tables: Option<bool>,
    auto_translate: Option<bool>,
    use_cache: Option<bool>,
    max_concurrent: Option<usize>,
}

fn options_from(
    extract_images: Option<bool>,
    preserve_formatting: Option<bool>,
    extract_tables: Option<bool>,
    auto_translate: Option<bool>,
) -> ProcessingOptions {
    let defaults = ProcessingOptions::default();
    ProcessingOptions {
        extract_images: extract_images.unwrap_or(defaults.extract_images),
        preserve_formatting: preserve_formatting.unwrap_or(defaults.preserve_formatting),
        extract_tables: extract_tables.unwrap_or(defaults.extract_tables),
        auto_translate: auto_translate.unwrap_or(defaults.auto_translate),
    }
}

impl ProcessQuery {
    fn options(&self) -> ProcessingOptions {
        options_from(
            self.extract_images,
            self.preserve_formatting,
            self.extract_tables,
            self.auto_translate,
        )
    }
}

impl BatchQuery {
    fn options(&self) -> ProcessingOptions {
        options_from(
            self.extract_images,
            self.preserve_formatting,
            self.extract_tables,
            self.auto_translate,
        )
    }
}

#[derive(Serialize)]
pub struct ProcessResponse {
    success: bool,
    result: ProcessingResult,
}

#[derive(Serialize)]
pub struct BatchResponse {
    success: bool,
    results: Vec<ProcessingResult>,
    statistics: StatisticsSnapshot,
}

/// Reduce a client-supplied name to a safe single path component
fn sanitize_file_name(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_' | ' ') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim().trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

/// Temporary staging area for one request's uploads
struct UploadStaging {
    dir: TempDir,
    paths: Vec<PathBuf>,
}

impl UploadStaging {
    fn new() -> Result<Self> {
        Ok(Self {
            dir: TempDir::new()?,
            paths: Vec::new(),
        })
    }

    /// Check the declared type, then write the field to disk
    async fn stage(&mut self, field: Field<'_>) -> Result<()> {
        let original = field.file_name().unwrap_or("upload").to_string();
        let file_name = sanitize_file_name(&original);
        let content_type = field.content_type().map(|s| s.to_string());

        let accepted = match content_type.as_deref() {
            Some(ct) if ct != "application/octet-stream" => is_supported_mime(ct),
            _ => supported_mime_type(&file_name).is_some(),
        };
        if !accepted {
            return Err(AppError::BadRequest(format!(
                "Unsupported file type for {}: {}",
                original,
                content_type.as_deref().unwrap_or("unknown")
            )));
        }

        let data = field.bytes().await.map_err(|e| {
            tracing::error!("Failed to read file data: {}", e);
            AppError::BadRequest(format!("Failed to read file data: {}", e))
        })?;

        let slot = self.dir.path().join(self.paths.len().to_string());
        tokio::fs::create_dir_all(&slot).await?;
        let path = slot.join(&file_name);
        tokio::fs::write(&path, &data).await?;

        tracing::debug!(file_name = %file_name, bytes = data.len(), "Staged upload");
        self.paths.push(path);
        Ok(())
    }
}

async fn next_field(multipart: &mut Multipart) -> Result<Option<Field<'_>>> {
    multipart.next_field().await.map_err(|e| {
        tracing::error!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read upload: {}", e))
    })
}

/// `POST /api/ocr/process`: extract a single uploaded document
async fn process_document(
    State(state): State<AppState>,
    Query(query): Query<ProcessQuery>,
    mut multipart: Multipart,
) -> Result<Json<ProcessResponse>> {
    let mut staging = UploadStaging::new()?;

    while let Some(field) = next_field(&mut multipart).await? {
        if field.name() == Some("file") {
            staging.stage(field).await?;
            break;
        }
    }

    let path = staging
        .paths
        .first()
        .ok_or_else(|| AppError::BadRequest("Missing multipart field 'file'".to_string()))?;

    let result = state
        .processor()
        .process_one(path, &query.options(), query.use_cache.unwrap_or(true))
        .await;

    Ok(Json(ProcessResponse {
        success: result.is_success(),
        result,
    }))
}

/// `POST /api/ocr/batch`: extract up to ten uploaded documents
async fn process_batch(
    State(state): State<AppState>,
    Query(query): Query<BatchQuery>,
    mut multipart: Multipart,
) -> Result<Json<BatchResponse>> {
    let mut staging = UploadStaging::new()?;
    let mut count = 0;

    while let Some(field) = next_field(&mut multipart).await? {
        if !matches!(field.name(), Some("files") | Some("file")) {
            continue;
        }
        count += 1;
        // Reject as soon as the limit is crossed, before staging more bytes.
        ensure_batch_size(count)?;
        staging.stage(field).await?;
    }

    if staging.paths.is_empty() {
        return Err(AppError::BadRequest(
            "Missing multipart field 'files'".to_string(),
        ));
    }

    let max_concurrent = query
        .max_concurrent
        .unwrap_or(state.config().processing.max_concurrent);

    let outcome = state
        .processor()
        .submit_batch(
            &staging.paths,
            &query.options(),
            max_concurrent,
            query.use_cache.unwrap_or(true),
        )
        .await?;

    Ok(Json(BatchResponse {
        success: true,
        results: outcome.results,
        statistics: outcome.statistics,
    }))
}
