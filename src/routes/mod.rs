//! HTTP routes for the docsight service

pub mod cache;
pub mod health;
pub mod ocr;
pub mod stats;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the full application router
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let max_file_size = state.config().processing.max_file_size;

    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/health", get(health::health_check))
        .route("/api/statistics", get(stats::get_statistics))
        .route("/api/cache/clear", post(cache::clear_cache))
        .nest("/api/ocr", ocr::router(max_file_size))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
