pub mod health;

use axum::{
    http::Uri,
    routing::{get, post},
    Router,
};

use crate::errors::AppError;
use crate::generation::handlers;
use crate::proxy::handle_pac;
use crate::render::index_handler;
use crate::state::AppState;

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("No route for {}", uri.path()))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health::health_handler))
        // Generation API
        .route("/api/qna", post(handlers::handle_qna))
        .route("/api/blog", post(handlers::handle_blog))
        .route("/api/proposal-image", post(handlers::handle_proposal_image))
        // Browser extension
        .route("/proxy.pac", get(handle_pac))
        .fallback(not_found)
        .with_state(state)
}
