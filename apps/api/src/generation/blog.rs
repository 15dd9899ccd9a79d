//! Blog article pipeline: one search, one tagged draft, SEO scoring.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::knowledge::{domain_knowledge, knowledge_block};
use crate::generation::persona::{parse_tones, persona_block};
use crate::generation::prompts::{bullet_lines, fill_template, BLOG_PROMPT_TEMPLATE, BLOG_SYSTEM};
use crate::generation::sections::{split_keywords, Sections};
use crate::generation::{ContentSource, DegradeReason};
use crate::llm_client::prompts::{quoted, COMPLIANCE_INSTRUCTION, TAG_FORMAT_INSTRUCTION};
use crate::llm_client::{LlmError, TextGenerator};
use crate::search::{NaverSearchClient, SearchKind};

pub const MAX_HASHTAGS: usize = 10;
pub const SUBHEADING_MARK: char = '■';

const DEFAULT_BLOG_TARGET: &str = "보험을 처음 알아보는 독자";

// Score weights
const TITLE_POINTS: i32 = 25;
const LONG_BODY_POINTS: i32 = 25;
const MEDIUM_BODY_POINTS: i32 = 10;
const KEYWORD_DENSITY_POINTS: i32 = 25;
const SPARSE_KEYWORD_POINTS: i32 = 10;
const HASHTAG_POINTS: i32 = 15;
const FEW_HASHTAG_POINTS: i32 = 8;
const SUBHEADING_POINTS: i32 = 10;

#[derive(Debug, Clone, Deserialize)]
pub struct BlogRequest {
    pub topic: String,
    pub insurance_type: String,
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub tone: String,
}

impl BlogRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.insurance_type.trim().is_empty() {
            return Err(AppError::Validation(
                "insurance_type cannot be empty".to_string(),
            ));
        }
        if self.topic.trim().is_empty() {
            return Err(AppError::Validation("topic cannot be empty".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlogSeoReport {
    pub score: i32,
    pub grade: char,
    pub title_has_keyword: bool,
    pub body_chars: usize,
    pub keyword_count: usize,
    pub hashtag_count: usize,
    pub has_subheadings: bool,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlogPost {
    pub request_id: Uuid,
    pub title: String,
    pub body: String,
    pub hashtags: Vec<String>,
    pub seo: BlogSeoReport,
    pub source: ContentSource,
    pub generated_at: DateTime<Utc>,
}

/// Weighted SEO score for a blog article, keyed on the main keyword.
pub fn score_blog_seo(keyword: &str, title: &str, body: &str, hashtags: &[String]) -> BlogSeoReport {
    let keyword = keyword.trim();
    let mut score = 0;
    let mut suggestions = Vec::new();

    let title_has_keyword = !keyword.is_empty() && title.contains(keyword);
    if title_has_keyword {
        score += TITLE_POINTS;
    } else {
        suggestions.push(format!("제목에 메인 키워드 '{keyword}'를 넣으세요"));
    }

    let body_chars = body.chars().count();
    if body_chars >= 1500 {
        score += LONG_BODY_POINTS;
    } else if body_chars >= 800 {
        score += MEDIUM_BODY_POINTS;
        suggestions.push("본문을 1500자 이상으로 늘리세요".to_string());
    } else {
        suggestions.push("본문이 너무 짧습니다 (1500자 이상 권장)".to_string());
    }

    let keyword_count = if keyword.is_empty() {
        0
    } else {
        body.matches(keyword).count()
    };
    match keyword_count {
        3..=10 => score += KEYWORD_DENSITY_POINTS,
        1..=2 => {
            score += SPARSE_KEYWORD_POINTS;
            suggestions.push("본문에 메인 키워드를 3회 이상 사용하세요".to_string());
        }
        0 => suggestions.push("본문에 메인 키워드가 없습니다".to_string()),
        _ => {
            score += SPARSE_KEYWORD_POINTS;
            suggestions.push("메인 키워드가 과도하게 반복됩니다 (10회 이하 권장)".to_string());
        }
    }

    let hashtag_count = hashtags.len();
    if hashtag_count >= 5 {
        score += HASHTAG_POINTS;
    } else if hashtag_count >= 3 {
        score += FEW_HASHTAG_POINTS;
        suggestions.push("해시태그를 5개 이상 사용하세요".to_string());
    } else {
        suggestions.push("해시태그가 부족합니다".to_string());
    }

    let has_subheadings = body
        .lines()
        .any(|line| line.trim_start().starts_with(SUBHEADING_MARK));
    if has_subheadings {
        score += SUBHEADING_POINTS;
    } else {
        suggestions.push("'■ ' 소제목으로 본문을 나누세요".to_string());
    }

    let score = score.clamp(0, 100);
    let grade = match score {
        s if s >= 80 => 'A',
        s if s >= 60 => 'B',
        _ => 'C',
    };

    BlogSeoReport {
        score,
        grade,
        title_has_keyword,
        body_chars,
        keyword_count,
        hashtag_count,
        has_subheadings,
        suggestions,
    }
}

pub fn build_blog_prompt(
    persona: &str,
    target: &str,
    insurance_type: &str,
    topic: &str,
    facts: &[String],
) -> String {
    fill_template(
        BLOG_PROMPT_TEMPLATE,
        &[
            ("persona_block", persona),
            ("knowledge_block", &knowledge_block(insurance_type)),
            ("target", &quoted(target)),
            ("insurance_type", &quoted(insurance_type)),
            ("topic", &quoted(topic)),
            ("facts", &bullet_lines(facts, "일반적으로 알려진 제도 사실만 사용")),
            ("compliance", COMPLIANCE_INSTRUCTION),
            ("tag_format", TAG_FORMAT_INSTRUCTION),
        ],
    )
}

/// Hashtags as `#word`, one per whitespace-separated word.
fn parse_hashtags(raw: &str) -> Vec<String> {
    split_keywords(raw, MAX_HASHTAGS)
        .into_iter()
        .flat_map(|kw| {
            kw.split_whitespace()
                .map(|w| format!("#{w}"))
                .collect::<Vec<_>>()
        })
        .fold(Vec::new(), |mut acc: Vec<String>, tag| {
            if !acc.contains(&tag) && acc.len() < MAX_HASHTAGS {
                acc.push(tag);
            }
            acc
        })
}

/// Article served when the model is unavailable or ignores the tags.
pub fn fallback_article(insurance_type: &str, topic: &str) -> (String, String, Vec<String>) {
    let knowledge = domain_knowledge(insurance_type);
    let title = format!("{insurance_type} {topic}, 가입 전에 꼭 알아야 할 것");
    let coverage = bullet_lines(
        &knowledge
            .coverage_items
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>(),
        "",
    );
    let cautions = bullet_lines(
        &knowledge
            .cautions
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>(),
        "",
    );
    let body = format!(
        "■ {insurance_type}이(가) 필요한 이유\n{summary}\n\n\
         ■ {insurance_type} 주요 보장\n{coverage}\n\n\
         ■ {insurance_type} 가입 전 확인할 점\n{cautions}\n\n\
         보장 내용은 상품과 약관에 따라 다를 수 있으니 가입 전 꼼꼼히 비교해 보세요.",
        summary = knowledge.summary,
    );
    let compact = insurance_type.split_whitespace().collect::<String>();
    let hashtags = vec![
        format!("#{compact}"),
        format!("#{compact}추천"),
        format!("#{compact}비교"),
        "#보험상담".to_string(),
        "#보험정보".to_string(),
    ];
    (title, body, hashtags)
}

pub async fn generate_blog(
    llm: &dyn TextGenerator,
    search: &NaverSearchClient,
    request: BlogRequest,
) -> Result<BlogPost, AppError> {
    request.validate()?;
    let request_id = Uuid::new_v4();
    let insurance_type = request.insurance_type.trim().to_string();
    let topic = request.topic.trim().to_string();
    let target = match request.target.trim() {
        "" => DEFAULT_BLOG_TARGET.to_string(),
        t => t.to_string(),
    };

    let facts: Vec<String> = search
        .search_or_empty(SearchKind::Blog, &format!("{insurance_type} {topic}"))
        .await
        .iter()
        .map(|item| item.as_fact())
        .take(5)
        .collect();

    let persona = persona_block(&parse_tones(&request.tone));
    let prompt = build_blog_prompt(&persona, &target, &insurance_type, &topic, &facts);

    let drafted = match llm.generate(&prompt, BLOG_SYSTEM).await {
        Ok(reply) => {
            let sections = Sections::parse(&reply);
            // Models sometimes number single tags ([제목1]); accept both forms
            let first = |base: &str| sections.numbered(base, 1).into_iter().next();
            match (first("제목"), first("본문")) {
                (Some(title), Some(body)) => Ok((
                    title,
                    body,
                    first("해시태그")
                        .map(|raw| parse_hashtags(&raw))
                        .unwrap_or_default(),
                )),
                _ => Err(DegradeReason::Malformed),
            }
        }
        Err(LlmError::NoCredentials) => return Err(AppError::missing_keys()),
        Err(e) => {
            warn!("[{request_id}] Blog draft failed: {e}");
            Err(DegradeReason::from(&e))
        }
    };

    let ((title, body, hashtags), source) = match drafted {
        Ok(article) => (article, ContentSource::Model),
        Err(reason) => {
            warn!("[{request_id}] Serving fallback blog article ({reason:?})");
            (
                fallback_article(&insurance_type, &topic),
                ContentSource::Fallback(reason),
            )
        }
    };

    let seo = score_blog_seo(&insurance_type, &title, &body, &hashtags);
    info!(
        "[{request_id}] Blog article ready: {} chars, seo={} ({})",
        seo.body_chars, seo.score, seo.grade
    );

    Ok(BlogPost {
        request_id,
        title,
        body,
        hashtags,
        seo,
        source,
        generated_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::testing::ScriptedLlm;

    fn tags(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("#tag{i}")).collect()
    }

    fn body_with(keyword: &str, times: usize, filler_chars: usize) -> String {
        let mut body = String::from("■ 소제목\n");
        for _ in 0..times {
            body.push_str(keyword);
            body.push(' ');
        }
        body.push_str(&"가".repeat(filler_chars));
        body
    }

    #[test]
    fn test_perfect_article_scores_100() {
        let body = body_with("암보험", 5, 1600);
        let report = score_blog_seo("암보험", "암보험 가이드", &body, &tags(5));
        assert_eq!(report.score, 100);
        assert_eq!(report.grade, 'A');
        assert!(report.suggestions.is_empty());
    }

    #[test]
    fn test_partial_credit_bands() {
        // title 0, medium body 10, sparse keyword 10, few hashtags 8, subheading 10
        let body = body_with("암보험", 2, 900);
        let report = score_blog_seo("암보험", "보험 가이드", &body, &tags(3));
        assert_eq!(report.score, 38);
        assert_eq!(report.grade, 'C');
        assert_eq!(report.keyword_count, 2);
        assert!(!report.title_has_keyword);
    }

    #[test]
    fn test_keyword_stuffing_gets_reduced_credit() {
        let body = body_with("암보험", 11, 1600);
        let report = score_blog_seo("암보험", "암보험", &body, &tags(5));
        assert_eq!(report.keyword_count, 11);
        assert_eq!(report.score, 25 + 25 + 10 + 15 + 10);
        assert_eq!(report.grade, 'A');
    }

    #[test]
    fn test_grade_b_band() {
        let body = "짧은 본문 암보험 암보험 암보험";
        let report = score_blog_seo("암보험", "암보험", body, &tags(5));
        // title 25, keyword 25, hashtags 15
        assert_eq!(report.score, 65);
        assert_eq!(report.grade, 'B');
        assert!(!report.has_subheadings);
    }

    #[test]
    fn test_parse_hashtags_normalizes() {
        assert_eq!(
            parse_hashtags("#암보험 #진단비, 보험 상담"),
            vec!["#암보험", "#진단비", "#보험", "#상담"]
        );
    }

    #[test]
    fn test_fallback_article_scores_subheadings() {
        let (title, body, hashtags) = fallback_article("암보험", "진단비");
        let report = score_blog_seo("암보험", &title, &body, &hashtags);
        assert!(report.title_has_keyword);
        assert!(report.has_subheadings);
        assert_eq!(report.hashtag_count, 5);
    }

    fn request() -> BlogRequest {
        BlogRequest {
            topic: "진단비 얼마나".into(),
            insurance_type: "암보험".into(),
            target: String::new(),
            tone: "친근한".into(),
        }
    }

    fn offline_search() -> NaverSearchClient {
        NaverSearchClient::new("http://127.0.0.1:9", None, None).unwrap()
    }

    #[tokio::test]
    async fn test_generate_blog_parses_tags() {
        let llm = ScriptedLlm::always(
            "[제목] 암보험 진단비 정리\n[본문] ■ 왜 필요할까\n암보험 이야기\n[해시태그] #암보험 #진단비",
        );
        let post = generate_blog(&llm, &offline_search(), request()).await.unwrap();
        assert_eq!(post.title, "암보험 진단비 정리");
        assert!(post.body.starts_with("■ 왜 필요할까"));
        assert_eq!(post.hashtags, vec!["#암보험", "#진단비"]);
        assert_eq!(post.source, ContentSource::Model);
        assert!(llm.prompts()[0].contains("\"보험을 처음 알아보는 독자\""));
    }

    #[tokio::test]
    async fn test_numbered_tags_are_accepted() {
        let llm = ScriptedLlm::always(
            "[제목1] 암보험 정리\n[본문1] ■ 소제목\n암보험 이야기\n[해시태그1] #암보험 #보장",
        );
        let post = generate_blog(&llm, &offline_search(), request()).await.unwrap();
        assert_eq!(post.source, ContentSource::Model);
        assert_eq!(post.title, "암보험 정리");
        assert!(post.body.starts_with("■ 소제목"));
        assert_eq!(post.hashtags, vec!["#암보험", "#보장"]);
    }

    #[tokio::test]
    async fn test_untagged_reply_falls_back() {
        let llm = ScriptedLlm::always("그냥 평범한 글");
        let post = generate_blog(&llm, &offline_search(), request()).await.unwrap();
        assert_eq!(post.source, ContentSource::Fallback(DegradeReason::Malformed));
        assert!(post.title.contains("암보험"));
    }

    #[tokio::test]
    async fn test_unavailable_model_falls_back() {
        let llm = ScriptedLlm::unavailable();
        let post = generate_blog(&llm, &offline_search(), request()).await.unwrap();
        assert_eq!(
            post.source,
            ContentSource::Fallback(DegradeReason::Unavailable)
        );
    }

    #[tokio::test]
    async fn test_missing_keys_is_an_error() {
        let llm = ScriptedLlm::no_credentials();
        let err = generate_blog(&llm, &offline_search(), request()).await.unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_empty_topic_rejected() {
        let llm = ScriptedLlm::always("unused");
        let mut req = request();
        req.topic = " ".into();
        let err = generate_blog(&llm, &offline_search(), req).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
