//! Cache maintenance endpoint

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::state::AppState;

const DEFAULT_MAX_AGE_DAYS: u64 = 30;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClearCacheQuery {
    older_than_days: Option<u64>,
}

#[derive(Serialize)]
pub struct ClearCacheResponse {
    success: bool,
    removed_files: usize,
}

pub async fn clear_cache(
    State(state): State<AppState>,
    Query(query): Query<ClearCacheQuery>,
) -> Result<Json<ClearCacheResponse>> {
    let days = query.older_than_days.unwrap_or(DEFAULT_MAX_AGE_DAYS);
    let removed_files = state.processor().clear_cache(days).await?;

    tracing::info!(removed_files, older_than_days = days, "Cache cleared");

    Ok(Json(ClearCacheResponse {
        success: true,
        removed_files,
    }))
}
