use std::sync::Arc;

use crate::config::Config;
use crate::generation::audit::ContentAuditor;
use crate::image::ImageClient;
use crate::llm_client::TextGenerator;
use crate::proxy::ProxySettings;
use crate::search::NaverSearchClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Text model behind the key rotator. Tests swap in a scripted generator.
    pub llm: Arc<dyn TextGenerator>,
    /// Pluggable self-audit. Default: HeuristicAuditor.
    pub auditor: Arc<dyn ContentAuditor>,
    pub search: NaverSearchClient,
    pub images: ImageClient,
    pub proxy: ProxySettings,
}
