//! Naver search client: blog and news lookups used as "facts" for prompts.
//!
//! Search is best-effort: missing credentials or a failing vendor yield an
//! empty fact list, never a request error.

use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use thiserror::Error;
use tracing::{debug, warn};

const DISPLAY_COUNT: u32 = 5;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search credentials are not configured")]
    NotConfigured,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Search API error (status {0})")]
    Api(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    Blog,
    News,
}

impl SearchKind {
    fn path(self) -> &'static str {
        match self {
            SearchKind::Blog => "/v1/search/blog.json",
            SearchKind::News => "/v1/search/news.json",
        }
    }
}

/// One search hit with markup already stripped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchItem {
    pub title: String,
    pub description: String,
}

impl SearchItem {
    /// Renders the hit as a single fact line for prompts.
    pub fn as_fact(&self) -> String {
        if self.description.is_empty() {
            self.title.clone()
        } else {
            format!("{} - {}", self.title, self.description)
        }
    }
}

#[derive(Debug, Deserialize)]
struct NaverSearchResult {
    #[serde(default)]
    items: Vec<NaverItem>,
}

#[derive(Debug, Deserialize)]
struct NaverItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
}

#[derive(Clone)]
pub struct NaverSearchClient {
    client: Client,
    base_url: String,
    credentials: Option<(String, String)>,
}

impl NaverSearchClient {
    pub fn new(
        base_url: impl Into<String>,
        client_id: Option<String>,
        client_secret: Option<String>,
    ) -> reqwest::Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(10))
                .build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials: client_id.zip(client_secret),
        })
    }

    pub async fn search(&self, kind: SearchKind, query: &str) -> Result<Vec<SearchItem>, SearchError> {
        let (client_id, client_secret) =
            self.credentials.as_ref().ok_or(SearchError::NotConfigured)?;

        let display = DISPLAY_COUNT.to_string();
        let response = self
            .client
            .get(format!("{}{}", self.base_url, kind.path()))
            .query(&[("query", query), ("display", display.as_str()), ("sort", "sim")])
            .header("X-Naver-Client-Id", client_id)
            .header("X-Naver-Client-Secret", client_secret)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SearchError::Api(response.status().as_u16()));
        }

        let result: NaverSearchResult = response.json().await?;
        let items: Vec<SearchItem> = result
            .items
            .into_iter()
            .map(|item| SearchItem {
                title: strip_markup(&item.title),
                description: strip_markup(&item.description),
            })
            .filter(|item| !item.title.is_empty())
            .collect();

        debug!("Naver {:?} search for {:?}: {} items", kind, query, items.len());
        Ok(items)
    }

    /// Same as `search`, but any failure degrades to an empty list.
    pub async fn search_or_empty(&self, kind: SearchKind, query: &str) -> Vec<SearchItem> {
        match self.search(kind, query).await {
            Ok(items) => items,
            Err(SearchError::NotConfigured) => {
                debug!("Naver search skipped: credentials not configured");
                Vec::new()
            }
            Err(e) => {
                warn!("Naver {:?} search failed, continuing without facts: {e}", kind);
                Vec::new()
            }
        }
    }
}

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("valid tag regex"))
}

/// Removes HTML tags (Naver wraps matches in `<b>`) and decodes the common
/// entities.
pub fn strip_markup(raw: &str) -> String {
    let without_tags = tag_regex().replace_all(raw, "");
    without_tags
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_strip_markup_removes_bold_and_entities() {
        assert_eq!(
            strip_markup("<b>암보험</b> 비교 &quot;필수&quot;  가이드 &amp; 팁"),
            "암보험 비교 \"필수\" 가이드 & 팁"
        );
    }

    #[test]
    fn test_as_fact_joins_title_and_description() {
        let item = SearchItem {
            title: "실손보험 개편".into(),
            description: "4세대 실손 전환".into(),
        };
        assert_eq!(item.as_fact(), "실손보험 개편 - 4세대 실손 전환");
    }

    #[tokio::test]
    async fn test_missing_credentials_degrade_to_empty() {
        let client = NaverSearchClient::new("http://127.0.0.1:9", None, None).unwrap();
        assert!(matches!(
            client.search(SearchKind::Blog, "암보험").await,
            Err(SearchError::NotConfigured)
        ));
        assert!(client.search_or_empty(SearchKind::Blog, "암보험").await.is_empty());
    }

    #[tokio::test]
    async fn test_search_sends_credentials_and_strips_markup() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/search/news.json"))
            .and(query_param("query", "치아보험"))
            .and(header("X-Naver-Client-Id", "id"))
            .and(header("X-Naver-Client-Secret", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [
                    { "title": "<b>치아보험</b> 면책기간", "description": "가입 후 1년" },
                    { "title": "", "description": "dropped" }
                ]
            })))
            .mount(&server)
            .await;

        let client =
            NaverSearchClient::new(server.uri(), Some("id".into()), Some("secret".into())).unwrap();
        let items = client.search(SearchKind::News, "치아보험").await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "치아보험 면책기간");
    }

    #[tokio::test]
    async fn test_vendor_error_degrades_to_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client =
            NaverSearchClient::new(server.uri(), Some("id".into()), Some("bad".into())).unwrap();
        assert!(matches!(
            client.search(SearchKind::Blog, "q").await,
            Err(SearchError::Api(401))
        ));
        assert!(client.search_or_empty(SearchKind::Blog, "q").await.is_empty());
    }
}
