//! Processing statistics endpoint

use axum::{extract::State, Json};

use crate::processor::StatisticsSnapshot;
use crate::state::AppState;

pub async fn get_statistics(State(state): State<AppState>) -> Json<StatisticsSnapshot> {
    Json(state.processor().statistics())
}
