use anyhow::{Context, Result};

use crate::proxy::Upstream;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_NAVER_BASE_URL: &str = "https://openapi.naver.com";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_IMAGE_MODELS: &[&str] = &[
    "gemini-2.5-flash-image",
    "gemini-2.0-flash-preview-image-generation",
];

/// Application configuration loaded from environment variables.
///
/// Missing vendor keys are NOT a startup failure: each request that needs them
/// answers with a configuration error instead.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_keys: Vec<String>,
    pub gemini_image_api_keys: Vec<String>,
    pub gemini_text_model: String,
    pub gemini_image_models: Vec<String>,
    pub gemini_base_url: String,
    pub naver_client_id: Option<String>,
    pub naver_client_secret: Option<String>,
    pub naver_base_url: String,
    pub proxy_domain_suffix: String,
    pub proxy_upstreams: Vec<Upstream>,
    pub allowed_origin: Option<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. `from_env` passes the
    /// process environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut gemini_api_keys = optional("GEMINI_API_KEYS")
            .map(|v| parse_list(&v))
            .unwrap_or_default();
        if gemini_api_keys.is_empty() {
            gemini_api_keys = optional("GEMINI_API_KEY")
                .map(|v| parse_list(&v))
                .unwrap_or_default();
        }

        let gemini_image_api_keys = optional("GEMINI_IMAGE_API_KEYS")
            .map(|v| parse_list(&v))
            .unwrap_or_else(|| gemini_api_keys.clone());

        let gemini_image_models = optional("GEMINI_IMAGE_MODELS")
            .map(|v| parse_list(&v))
            .unwrap_or_else(|| DEFAULT_IMAGE_MODELS.iter().map(|m| m.to_string()).collect());

        let proxy_upstreams = match optional("PROXY_UPSTREAMS") {
            Some(raw) => parse_list(&raw)
                .iter()
                .map(|entry| {
                    entry
                        .parse::<Upstream>()
                        .with_context(|| format!("Invalid PROXY_UPSTREAMS entry '{entry}'"))
                })
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };

        Ok(Config {
            gemini_api_keys,
            gemini_image_api_keys,
            gemini_text_model: optional("GEMINI_TEXT_MODEL")
                .unwrap_or_else(|| DEFAULT_TEXT_MODEL.to_string()),
            gemini_image_models,
            gemini_base_url: optional("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            naver_client_id: optional("NAVER_CLIENT_ID"),
            naver_client_secret: optional("NAVER_CLIENT_SECRET"),
            naver_base_url: optional("NAVER_BASE_URL")
                .unwrap_or_else(|| DEFAULT_NAVER_BASE_URL.to_string()),
            proxy_domain_suffix: optional("PROXY_DOMAIN_SUFFIX")
                .unwrap_or_else(|| "naver.com".to_string()),
            proxy_upstreams,
            allowed_origin: optional("ALLOWED_ORIGIN"),
            port: optional("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: optional("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

/// Splits a comma-separated value, dropping blanks and stray quotes.
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_matches(|c| c == '"' || c == '\'').trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_without_any_env() {
        let config = config_from(&[]).unwrap();
        assert!(config.gemini_api_keys.is_empty());
        assert!(config.gemini_image_api_keys.is_empty());
        assert_eq!(config.gemini_text_model, DEFAULT_TEXT_MODEL);
        assert_eq!(config.gemini_image_models.len(), 2);
        assert_eq!(config.port, 8080);
        assert!(config.naver_client_id.is_none());
    }

    #[test]
    fn test_key_list_is_split_and_trimmed() {
        let config = config_from(&[("GEMINI_API_KEYS", " k1, 'k2' ,,k3 ")]).unwrap();
        assert_eq!(config.gemini_api_keys, vec!["k1", "k2", "k3"]);
    }

    #[test]
    fn test_single_key_variable_is_accepted() {
        let config = config_from(&[("GEMINI_API_KEY", "solo")]).unwrap();
        assert_eq!(config.gemini_api_keys, vec!["solo"]);
    }

    #[test]
    fn test_image_keys_default_to_text_keys() {
        let config = config_from(&[("GEMINI_API_KEYS", "a,b")]).unwrap();
        assert_eq!(config.gemini_image_api_keys, vec!["a", "b"]);

        let config =
            config_from(&[("GEMINI_API_KEYS", "a,b"), ("GEMINI_IMAGE_API_KEYS", "img")]).unwrap();
        assert_eq!(config.gemini_image_api_keys, vec!["img"]);
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        assert!(config_from(&[("PORT", "not-a-port")]).is_err());
    }

    #[test]
    fn test_proxy_upstreams_are_parsed() {
        let config =
            config_from(&[("PROXY_UPSTREAMS", "10.0.0.1:3128, proxy.local:8080")]).unwrap();
        assert_eq!(config.proxy_upstreams.len(), 2);
        assert_eq!(config.proxy_upstreams[1].host, "proxy.local");
        assert_eq!(config.proxy_upstreams[1].port, 8080);

        assert!(config_from(&[("PROXY_UPSTREAMS", "missing-port")]).is_err());
    }
}
