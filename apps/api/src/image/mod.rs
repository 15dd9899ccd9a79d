//! Image generation: Gemini image models behind a model × key fallback chain.
//!
//! Models are tried in order; within a model the keys are tried starting from
//! the rotator's current key. 403/429 moves to the next key, any other failure
//! (non-OK status, transport error, reply without an image) moves to the next
//! model. Exhausting the chain is reported as a failed `ImageOutcome`, never as
//! an error.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::llm_client::rotation::{mask_key, KeyRotator};
use crate::llm_client::LlmError;

pub mod prompts;

/// Result of one image request, serialized straight into handler responses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub attempts: u32,
}

impl ImageOutcome {
    fn success(model: &str, mime_type: &str, data: &str, attempts: u32) -> Self {
        Self {
            success: true,
            image: Some(format!("data:{mime_type};base64,{data}")),
            model: Some(model.to_string()),
            error: None,
            attempts,
        }
    }

    pub fn failure(error: String, attempts: u32) -> Self {
        Self {
            success: false,
            image: None,
            model: None,
            error: Some(error),
            attempts,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    #[serde(default)]
    candidates: Vec<ImageCandidate>,
}

#[derive(Debug, Deserialize)]
struct ImageCandidate {
    content: Option<ImageContent>,
}

#[derive(Debug, Deserialize)]
struct ImageContent {
    #[serde(default)]
    parts: Vec<ImagePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImagePart {
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

impl ImageResponse {
    /// First inline payload that decodes to a non-empty byte string.
    fn image(&self) -> Option<&InlineData> {
        self.candidates
            .iter()
            .filter_map(|c| c.content.as_ref())
            .flat_map(|c| c.parts.iter())
            .filter_map(|p| p.inline_data.as_ref())
            .find(|d| {
                STANDARD
                    .decode(d.data.as_bytes())
                    .map(|bytes| !bytes.is_empty())
                    .unwrap_or(false)
            })
    }
}

#[derive(Clone)]
pub struct ImageClient {
    client: Client,
    base_url: String,
    models: Vec<String>,
    keys: Arc<KeyRotator>,
}

impl ImageClient {
    pub fn new(
        base_url: impl Into<String>,
        models: Vec<String>,
        keys: Arc<KeyRotator>,
    ) -> reqwest::Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            models,
            keys,
        })
    }

    /// Runs the fallback chain. Only a missing key pool is an error.
    pub async fn generate(&self, prompt: &str) -> Result<ImageOutcome, LlmError> {
        if self.keys.is_empty() {
            return Err(LlmError::NoCredentials);
        }

        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "responseModalities": ["TEXT", "IMAGE"] }
        });

        let key_count = self.keys.len();
        let mut attempts = 0u32;
        let mut errors: Vec<String> = Vec::new();

        for model in &self.models {
            let url = format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, model
            );

            for key_attempt in 0..key_count {
                let Some(key) = self.keys.current() else {
                    return Err(LlmError::NoCredentials);
                };
                attempts += 1;

                let response = match self
                    .client
                    .post(&url)
                    .header("x-goog-api-key", key)
                    .json(&body)
                    .send()
                    .await
                {
                    Ok(r) => r,
                    Err(e) => {
                        errors.push(format!("{model}: network error: {e}"));
                        break;
                    }
                };

                let status = response.status();

                if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::FORBIDDEN {
                    warn!(
                        "Image model {} returned {} for key {}, rotating",
                        model,
                        status,
                        mask_key(key)
                    );
                    errors.push(format!("{model}: {status}"));
                    if key_attempt + 1 < key_count {
                        self.keys.advance();
                    }
                    continue;
                }

                if !status.is_success() {
                    warn!("Image model {} returned {}, trying next model", model, status);
                    errors.push(format!("{model}: {status}"));
                    break;
                }

                let text = match response.text().await {
                    Ok(t) => t,
                    Err(e) => {
                        errors.push(format!("{model}: network error: {e}"));
                        break;
                    }
                };
                let parsed: ImageResponse = match serde_json::from_str(&text) {
                    Ok(p) => p,
                    Err(e) => {
                        warn!("Image model {} sent an undecodable reply: {}", model, e);
                        errors.push(format!("{model}: malformed reply: {e}"));
                        break;
                    }
                };

                match parsed.image() {
                    Some(inline) => {
                        info!("Image generated by {} after {} attempts", model, attempts);
                        // Spread successive requests across the key pool
                        self.keys.advance();
                        return Ok(ImageOutcome::success(
                            model,
                            &inline.mime_type,
                            &inline.data,
                            attempts,
                        ));
                    }
                    None => {
                        warn!("Image model {} replied without image data", model);
                        errors.push(format!("{model}: no image in reply"));
                        break;
                    }
                }
            }
        }

        warn!("Image generation exhausted after {} attempts", attempts);
        Ok(ImageOutcome::failure(
            format!("이미지 생성에 실패했습니다: {}", errors.join("; ")),
            attempts,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PNG_B64: &str = "iVBORw0KGgo=";

    fn image_reply() -> serde_json::Value {
        json!({
            "candidates": [{ "content": { "parts": [
                { "text": "설계안 이미지입니다" },
                { "inlineData": { "mimeType": "image/png", "data": PNG_B64 } }
            ] } }]
        })
    }

    fn client(server: &MockServer, models: &[&str], keys: &[&str]) -> ImageClient {
        ImageClient::new(
            server.uri(),
            models.iter().map(|m| m.to_string()).collect(),
            Arc::new(KeyRotator::new(keys.iter().map(|k| k.to_string()).collect())),
        )
        .unwrap()
    }

    fn model_path(model: &str) -> String {
        format!("/v1beta/models/{model}:generateContent")
    }

    #[tokio::test]
    async fn test_falls_back_to_second_model_on_second_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(model_path("m1")))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(model_path("m2")))
            .and(header("x-goog-api-key", "k2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(image_reply()))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(model_path("m2")))
            .and(header("x-goog-api-key", "k1"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let images = client(&server, &["m1", "m2"], &["k1", "k2"]);
        let outcome = images.generate("prompt").await.unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.model.as_deref(), Some("m2"));
        assert_eq!(outcome.attempts, 3);
        assert_eq!(
            outcome.image.as_deref(),
            Some(format!("data:image/png;base64,{PNG_B64}").as_str())
        );
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_non_rate_limit_error_skips_to_next_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(model_path("m1")))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(model_path("m2")))
            .respond_with(ResponseTemplate::new(200).set_body_json(image_reply()))
            .mount(&server)
            .await;

        let images = client(&server, &["m1", "m2"], &["k1", "k2"]);
        let outcome = images.generate("prompt").await.unwrap();
        assert_eq!(outcome.model.as_deref(), Some("m2"));
        assert_eq!(outcome.attempts, 2);
    }

    #[tokio::test]
    async fn test_reply_without_image_skips_to_next_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(model_path("m1")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "content": { "parts": [{ "text": "no image" }] } }]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(model_path("m2")))
            .respond_with(ResponseTemplate::new(200).set_body_json(image_reply()))
            .mount(&server)
            .await;

        let images = client(&server, &["m1", "m2"], &["k1"]);
        let outcome = images.generate("prompt").await.unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.model.as_deref(), Some("m2"));
    }

    #[tokio::test]
    async fn test_garbage_success_body_skips_to_next_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(model_path("m1")))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(model_path("m2")))
            .respond_with(ResponseTemplate::new(200).set_body_json(image_reply()))
            .mount(&server)
            .await;

        let images = client(&server, &["m1", "m2"], &["k1"]);
        let outcome = images.generate("prompt").await.unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.model.as_deref(), Some("m2"));
        assert_eq!(outcome.attempts, 2);
    }

    #[tokio::test]
    async fn test_successive_requests_rotate_keys() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(model_path("m1")))
            .respond_with(ResponseTemplate::new(200).set_body_json(image_reply()))
            .mount(&server)
            .await;

        let images = client(&server, &["m1"], &["k1", "k2"]);
        for _ in 0..3 {
            assert!(images.generate("prompt").await.unwrap().success);
        }

        let used: Vec<String> = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .map(|r| {
                r.headers
                    .get("x-goog-api-key")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string()
            })
            .collect();
        assert_eq!(used, ["k1", "k2", "k1"]);
    }

    #[tokio::test]
    async fn test_exhausted_chain_returns_structured_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let images = client(&server, &["m1", "m2"], &["k1", "k2"]);
        let outcome = images.generate("prompt").await.unwrap();
        assert!(!outcome.success);
        assert!(outcome.image.is_none());
        assert!(outcome.error.is_some());
        assert_eq!(outcome.attempts, 4);
    }

    #[tokio::test]
    async fn test_no_keys_is_configuration_error() {
        let server = MockServer::start().await;
        let images = client(&server, &["m1"], &[]);
        assert!(matches!(
            images.generate("prompt").await,
            Err(LlmError::NoCredentials)
        ));
    }
}
