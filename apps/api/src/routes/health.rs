use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service status plus which vendor integrations are configured.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "bohum-writer-api",
        "text_model": state.config.gemini_text_model,
        "text_keys": state.config.gemini_api_keys.len(),
        "image_keys": state.config.gemini_image_api_keys.len(),
        "search_configured": state.config.naver_client_id.is_some()
            && state.config.naver_client_secret.is_some(),
    }))
}
