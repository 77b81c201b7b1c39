pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::extract::handlers as extract_handlers;
use crate::interview::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/chat", post(handlers::handle_chat))
        .route(
            "/api/upload-resume",
            post(extract_handlers::handle_upload_resume),
        )
        .route("/api/get-history", post(handlers::handle_get_history))
        .route(
            "/api/download-transcript",
            post(handlers::handle_download_transcript),
        )
        .route(
            "/api/transcript/:session_id",
            get(handlers::handle_transcript_file),
        )
        .layer(body_limit)
        .with_state(state)
}
