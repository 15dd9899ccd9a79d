mod config;
mod errors;
mod generation;
mod image;
mod llm_client;
mod proxy;
mod render;
mod routes;
mod search;
mod state;

use anyhow::{Context, Result};
use axum::http::HeaderValue;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::generation::audit::HeuristicAuditor;
use crate::image::ImageClient;
use crate::llm_client::rotation::KeyRotator;
use crate::llm_client::GeminiClient;
use crate::proxy::ProxySettings;
use crate::routes::build_router;
use crate::search::NaverSearchClient;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails only on malformed values)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting bohum-writer API v{}", env!("CARGO_PKG_VERSION"));

    // Key pools: one rotator per vendor surface
    let text_keys = Arc::new(KeyRotator::new(config.gemini_api_keys.clone()));
    let image_keys = Arc::new(KeyRotator::new(config.gemini_image_api_keys.clone()));
    if text_keys.is_empty() {
        warn!("No Gemini API keys configured; generation requests will fail with a configuration error");
    }

    // Initialize vendor clients
    let llm = GeminiClient::new(
        config.gemini_base_url.clone(),
        config.gemini_text_model.clone(),
        text_keys.clone(),
    )?;
    info!(
        "LLM client initialized (model: {}, keys: {})",
        llm.model(),
        text_keys.len()
    );

    let images = ImageClient::new(
        config.gemini_base_url.clone(),
        config.gemini_image_models.clone(),
        image_keys.clone(),
    )?;
    info!(
        "Image client initialized (models: {:?}, keys: {})",
        config.gemini_image_models,
        image_keys.len()
    );

    let search = NaverSearchClient::new(
        config.naver_base_url.clone(),
        config.naver_client_id.clone(),
        config.naver_client_secret.clone(),
    )?;

    let proxy = ProxySettings::new(
        config.proxy_domain_suffix.clone(),
        config.proxy_upstreams.clone(),
    );
    info!(
        "PAC routing *.{} through {} upstream(s)",
        proxy.domain_suffix,
        proxy.upstreams.len()
    );

    // Build app state
    let state = AppState {
        config: config.clone(),
        llm: Arc::new(llm),
        auditor: Arc::new(HeuristicAuditor),
        search,
        images,
        proxy,
    };

    let cors = match &config.allowed_origin {
        Some(origin) => CorsLayer::permissive().allow_origin(
            origin
                .parse::<HeaderValue>()
                .with_context(|| format!("ALLOWED_ORIGIN is not a valid origin: {origin}"))?,
        ),
        None => CorsLayer::permissive(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
