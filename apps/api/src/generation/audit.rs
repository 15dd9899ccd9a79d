//! Self-audit: heuristic quality scoring of a parsed Q&A post.
//!
//! Four independent checks each start at 100 and subtract fixed penalties:
//! SEO coverage, context consistency, expert diversity, comment realism.
//! Sub-scores are NOT clamped and may go negative. The overall score is the
//! rounded mean; a post passes when the mean reaches `PASS_THRESHOLD` and no
//! hard precondition (answer / comment counts) failed.
//!
//! `AppState` holds an `Arc<dyn ContentAuditor>`; `HeuristicAuditor` is the
//! default backend.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::generation::sections::GeneratedContent;
use crate::generation::strategy::SEO_KEYWORD_LIMIT;

pub const PASS_THRESHOLD: i32 = 70;

const SEO_MIN_KEYWORD_HITS: usize = 3;
const CONCERN_HEAD_CHARS: usize = 15;
const MIN_ANSWERS: usize = 3;
const MIN_ANSWER_CHARS: usize = 300;
const ANSWER_PREFIX_CHARS: usize = 30;
const MIN_CTA_ANSWERS: usize = 2;
const MIN_COMMENTS: usize = 3;
const GENERIC_COMMENT_MAX_CHARS: usize = 50;

pub const PENALTY_MISSING_INSURANCE_TYPE: i32 = 30;
pub const PENALTY_FEW_SEO_KEYWORDS: i32 = 20;
pub const PENALTY_QUESTION_OFF_TOPIC: i32 = 25;
pub const PENALTY_ANSWERS_OFF_TOPIC: i32 = 30;
pub const PENALTY_COMMENTS_OFF_TOPIC: i32 = 15;
pub const PENALTY_FEW_ANSWERS: i32 = 40;
pub const PENALTY_SHORT_ANSWER: i32 = 15;
pub const PENALTY_DUPLICATE_ANSWERS: i32 = 20;
pub const PENALTY_FEW_CTAS: i32 = 15;
pub const PENALTY_FEW_COMMENTS: i32 = 30;
pub const PENALTY_GENERIC_COMMENTS: i32 = 20;

pub const FAIL_NEED_ANSWERS: &str = "전문가 답변이 최소 3개 필요합니다";
pub const FAIL_NEED_COMMENTS: &str = "댓글이 최소 3개 필요합니다";

/// Call-to-action phrases an expert answer should carry.
const CTA_KEYWORDS: &[&str] = &[
    "상담", "문의", "연락", "비교해 보", "비교해보", "점검", "설계", "확인해 보", "확인해보",
    "쪽지", "댓글 남겨",
];

/// Words that make a comment read as a reaction to the concern.
const EMPATHY_WORDS: &[&str] = &["저도", "공감", "비슷한", "같은 고민", "걱정", "도움", "덕분"];

/// Phrases that, alone, make a comment look machine-generated.
const GENERIC_PRAISE: &[&str] = &[
    "좋은 정보 감사합니다",
    "좋은 정보 감사해요",
    "잘 보고 갑니다",
    "잘 보고 가요",
    "도움이 되었습니다",
    "도움이 됐어요",
    "도움 됐어요",
    "유익하네요",
    "좋은 정보",
    "좋은 글",
    "정보 감사",
    "감사합니다",
    "감사해요",
    "공감합니다",
    "최고예요",
    "최고",
    "ㅎㅎ",
    "ㅋㅋ",
    "^^",
];

/// Inputs the audit compares the content against.
#[derive(Debug, Clone, Default)]
pub struct AuditContext {
    pub concern: String,
    pub insurance_type: String,
    pub target: String,
    pub seo_keywords: Vec<String>,
    pub fact_checks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditResult {
    pub seo_score: i32,
    pub context_score: i32,
    pub expert_score: i32,
    pub comment_score: i32,
    pub overall: i32,
    pub passed: bool,
    /// Hard preconditions that failed, independent of the numeric score.
    pub fail_reasons: Vec<String>,
    /// Every penalized check, in check order.
    pub reasons: Vec<String>,
    pub suggestions: Vec<String>,
}

impl AuditResult {
    /// Everything the next generation attempt should fix.
    pub fn fix_list(&self) -> Vec<String> {
        let mut out = self.fail_reasons.clone();
        for r in &self.reasons {
            if !out.contains(r) {
                out.push(r.clone());
            }
        }
        out
    }
}

/// The auditor trait. Implement this to swap scoring backends without
/// touching the regeneration loop or handlers.
pub trait ContentAuditor: Send + Sync {
    fn audit(&self, content: &GeneratedContent, ctx: &AuditContext) -> AuditResult;
}

/// Default substring/length heuristics.
pub struct HeuristicAuditor;

impl ContentAuditor for HeuristicAuditor {
    fn audit(&self, content: &GeneratedContent, ctx: &AuditContext) -> AuditResult {
        audit_qna_content(content, ctx)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Checks
// ────────────────────────────────────────────────────────────────────────────

struct Check {
    score: i32,
    fail_reasons: Vec<String>,
    reasons: Vec<String>,
    suggestions: Vec<String>,
}

impl Check {
    fn new() -> Self {
        Self {
            score: 100,
            fail_reasons: Vec::new(),
            reasons: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    fn penalize(&mut self, penalty: i32, reason: String, suggestion: &str) {
        self.score -= penalty;
        self.reasons.push(reason);
        self.suggestions.push(suggestion.to_string());
    }

    fn hard_fail(&mut self, penalty: i32, reason: &str, suggestion: &str) {
        self.fail_reasons.push(reason.to_string());
        self.penalize(penalty, reason.to_string(), suggestion);
    }
}

/// Tokens of the concern worth matching: whitespace-split, punctuation
/// trimmed, at least two characters.
fn concern_tokens(concern: &str) -> Vec<String> {
    concern
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|t| t.chars().count() >= 2)
        .map(str::to_lowercase)
        .collect()
}

fn concern_head(concern: &str) -> String {
    concern
        .trim()
        .chars()
        .take(CONCERN_HEAD_CHARS)
        .collect::<String>()
        .to_lowercase()
}

fn mentions_concern(text: &str, tokens: &[String], head: &str) -> bool {
    let text = text.to_lowercase();
    (!head.is_empty() && text.contains(head)) || tokens.iter().any(|t| text.contains(t.as_str()))
}

fn check_seo(content: &GeneratedContent, ctx: &AuditContext) -> Check {
    let mut check = Check::new();
    let haystack = content
        .titles
        .iter()
        .chain(&content.questions)
        .chain(&content.answers)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n")
        .to_lowercase();

    let insurance_type = ctx.insurance_type.trim().to_lowercase();
    if !insurance_type.is_empty() && !haystack.contains(&insurance_type) {
        check.penalize(
            PENALTY_MISSING_INSURANCE_TYPE,
            format!("제목·질문·답변에 보험 종류 '{}'가 없습니다", ctx.insurance_type.trim()),
            "제목과 첫 문단에 보험 종류를 그대로 넣어 주세요",
        );
    }

    let keywords: Vec<String> = ctx
        .seo_keywords
        .iter()
        .take(SEO_KEYWORD_LIMIT)
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect();
    if !keywords.is_empty() {
        let required = SEO_MIN_KEYWORD_HITS.min(keywords.len());
        let hits = keywords.iter().filter(|k| haystack.contains(k.as_str())).count();
        if hits < required {
            check.penalize(
                PENALTY_FEW_SEO_KEYWORDS,
                format!("SEO 키워드가 {hits}개만 포함되었습니다 (최소 {required}개)"),
                "SEO 키워드를 본문에 자연스럽게 더 포함해 주세요",
            );
        }
    }

    check
}

fn check_context(content: &GeneratedContent, ctx: &AuditContext) -> Check {
    let mut check = Check::new();
    let tokens = concern_tokens(&ctx.concern);
    let head = concern_head(&ctx.concern);

    if !content
        .questions
        .iter()
        .any(|q| mentions_concern(q, &tokens, &head))
    {
        check.penalize(
            PENALTY_QUESTION_OFF_TOPIC,
            "질문이 고객 고민을 반영하지 않습니다".to_string(),
            "질문 본문에 고객 고민을 1인칭으로 구체적으로 써 주세요",
        );
    }

    if !content
        .answers
        .iter()
        .any(|a| mentions_concern(a, &tokens, &head))
    {
        check.penalize(
            PENALTY_ANSWERS_OFF_TOPIC,
            "답변이 고객 고민과 연결되지 않습니다".to_string(),
            "답변 첫 문장에서 질문자의 고민을 다시 짚어 주세요",
        );
    }

    let comments_related = content.comments.iter().any(|c| {
        mentions_concern(c, &tokens, &head) || EMPATHY_WORDS.iter().any(|w| c.contains(w))
    });
    if !comments_related {
        check.penalize(
            PENALTY_COMMENTS_OFF_TOPIC,
            "댓글이 질문 내용과 무관합니다".to_string(),
            "비슷한 경험이나 공감이 드러나는 댓글을 넣어 주세요",
        );
    }

    check
}

fn check_expert_diversity(content: &GeneratedContent) -> Check {
    let mut check = Check::new();
    let answers = &content.answers;

    if answers.len() < MIN_ANSWERS {
        check.hard_fail(
            PENALTY_FEW_ANSWERS,
            FAIL_NEED_ANSWERS,
            "서로 다른 전문가 답변 3개를 작성해 주세요",
        );
    }

    for (i, answer) in answers.iter().enumerate() {
        let len = answer.chars().count();
        if len < MIN_ANSWER_CHARS {
            check.penalize(
                PENALTY_SHORT_ANSWER,
                format!("답변{}이 너무 짧습니다 ({len}자, 최소 {MIN_ANSWER_CHARS}자)", i + 1),
                "각 답변을 근거와 사례를 포함해 300자 이상으로 늘려 주세요",
            );
        }
    }

    let prefixes: HashSet<String> = answers
        .iter()
        .map(|a| a.chars().take(ANSWER_PREFIX_CHARS).collect())
        .collect();
    if prefixes.len() < answers.len() {
        check.penalize(
            PENALTY_DUPLICATE_ANSWERS,
            "답변들의 도입부가 서로 같습니다".to_string(),
            "전문가마다 다른 관점과 첫 문장으로 시작해 주세요",
        );
    }

    let with_cta = answers
        .iter()
        .filter(|a| CTA_KEYWORDS.iter().any(|k| a.contains(k)))
        .count();
    if with_cta < MIN_CTA_ANSWERS {
        check.penalize(
            PENALTY_FEW_CTAS,
            format!("상담 유도 문구가 있는 답변이 {with_cta}개뿐입니다"),
            "답변 끝에 상담·비교 권유 문장을 넣어 주세요",
        );
    }

    check
}

/// A comment under 50 chars made only of stock praise phrases.
fn is_generic_praise(comment: &str) -> bool {
    if comment.chars().count() >= GENERIC_COMMENT_MAX_CHARS {
        return false;
    }
    let mut rest = comment.to_string();
    for phrase in GENERIC_PRAISE {
        rest = rest.replace(phrase, "");
    }
    !rest.chars().any(|c| c.is_alphanumeric())
}

fn check_comment_realism(content: &GeneratedContent) -> Check {
    let mut check = Check::new();

    if content.comments.len() < MIN_COMMENTS {
        check.hard_fail(
            PENALTY_FEW_COMMENTS,
            FAIL_NEED_COMMENTS,
            "경험과 질문이 담긴 댓글을 3개 이상 작성해 주세요",
        );
    }

    let generic = content
        .comments
        .iter()
        .filter(|c| is_generic_praise(c))
        .count();
    if generic > 1 {
        check.penalize(
            PENALTY_GENERIC_COMMENTS,
            format!("의례적인 칭찬 댓글이 {generic}개입니다"),
            "댓글마다 구체적인 상황이나 질문을 넣어 주세요",
        );
    }

    check
}

/// Looks for at least one fact-check string echoed in the answers. Only ever
/// adds a suggestion.
fn fact_suggestion(content: &GeneratedContent, ctx: &AuditContext) -> Option<String> {
    if ctx.fact_checks.is_empty() {
        return None;
    }
    let answers = content.answers.join("\n").to_lowercase();
    let cited = ctx.fact_checks.iter().any(|fact| {
        fact.split_whitespace()
            .filter(|t| t.chars().count() >= 2)
            .take(3)
            .any(|t| answers.contains(&t.to_lowercase()))
    });
    (!cited).then(|| "참고 사실을 답변에 한 가지 이상 인용하면 신뢰도가 올라갑니다".to_string())
}

/// Suggests surfacing the target persona when no question mentions it.
fn target_suggestion(content: &GeneratedContent, ctx: &AuditContext) -> Option<String> {
    let target = ctx.target.trim();
    let first = target.split_whitespace().next()?;
    let reflected = content
        .titles
        .iter()
        .chain(&content.questions)
        .any(|t| t.contains(first));
    (!reflected).then(|| format!("질문자 설정에 타깃 고객({target})의 상황이 드러나면 좋습니다"))
}

pub fn audit_qna_content(content: &GeneratedContent, ctx: &AuditContext) -> AuditResult {
    let seo = check_seo(content, ctx);
    let context = check_context(content, ctx);
    let expert = check_expert_diversity(content);
    let comment = check_comment_realism(content);

    let overall =
        ((seo.score + context.score + expert.score + comment.score) as f64 / 4.0).round() as i32;

    let mut fail_reasons = Vec::new();
    let mut reasons = Vec::new();
    let mut suggestions = Vec::new();
    for check in [&seo, &context, &expert, &comment] {
        fail_reasons.extend(check.fail_reasons.iter().cloned());
        reasons.extend(check.reasons.iter().cloned());
        for s in &check.suggestions {
            if !suggestions.contains(s) {
                suggestions.push(s.clone());
            }
        }
    }
    suggestions.extend(fact_suggestion(content, ctx));
    suggestions.extend(target_suggestion(content, ctx));

    AuditResult {
        seo_score: seo.score,
        context_score: context.score,
        expert_score: expert.score,
        comment_score: comment.score,
        overall,
        passed: overall >= PASS_THRESHOLD && fail_reasons.is_empty(),
        fail_reasons,
        reasons,
        suggestions,
    }
}
