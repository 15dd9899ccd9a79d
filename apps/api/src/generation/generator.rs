//! Q&A generation: orchestrates the full content pipeline.
//!
//! Flow: search (blog ∥ news) → strategy plan (LLM JSON) → draft (LLM text)
//!       → self-audit → bounded regeneration → optional design image.
//!
//! Upstream failures degrade to canned content; only a missing key pool is
//! surfaced to the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::audit::{AuditContext, AuditResult, ContentAuditor};
use crate::generation::knowledge::knowledge_block;
use crate::generation::persona::{parse_tones, persona_block};
use crate::generation::prompts::{
    bullet_lines, fill_template, fix_block, QNA_PROMPT_TEMPLATE, QNA_SYSTEM,
};
use crate::generation::sections::{GeneratedContent, Sections};
use crate::generation::strategy::{plan_strategy, StrategyPlan};
use crate::generation::{ContentSource, DegradeReason};
use crate::image::prompts::design_image_prompt;
use crate::image::{ImageClient, ImageOutcome};
use crate::llm_client::prompts::{quoted, COMPLIANCE_INSTRUCTION, TAG_FORMAT_INSTRUCTION};
use crate::llm_client::{LlmError, TextGenerator};
use crate::search::{NaverSearchClient, SearchItem, SearchKind};

/// Extra generation attempts after the first one when the audit fails.
pub const MAX_REGENERATION_ATTEMPTS: u32 = 2;

/// Upper bound on search facts handed to the strategy step.
const MAX_SEARCH_FACTS: usize = 6;

const DEFAULT_TARGET: &str = "보험 가입을 고민하는 일반 소비자";

/// Reason fed back when a reply carried no recognizable tags at all.
const FORMAT_FIX_REASON: &str = "대괄호 태그 형식([제목1], [답변1] 등)을 지키지 않았습니다";

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// Request body for Q&A generation.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationRequest {
    #[serde(default)]
    pub target: String,
    pub insurance_type: String,
    pub concern: String,
    #[serde(default)]
    pub tone: String,
    #[serde(default)]
    pub generate_design: bool,
}

impl GenerationRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.insurance_type.trim().is_empty() {
            return Err(AppError::Validation(
                "insurance_type cannot be empty".to_string(),
            ));
        }
        if self.concern.trim().is_empty() {
            return Err(AppError::Validation("concern cannot be empty".to_string()));
        }
        Ok(())
    }

    pub fn target_or_default(&self) -> &str {
        let target = self.target.trim();
        if target.is_empty() {
            DEFAULT_TARGET
        } else {
            target
        }
    }
}

/// Output of the draft → audit → regenerate loop.
#[derive(Debug, Clone)]
pub struct DraftOutcome {
    pub content: GeneratedContent,
    pub audit: AuditResult,
    /// Generation calls actually made (1 ..= MAX_REGENERATION_ATTEMPTS + 1).
    pub attempts: u32,
    pub source: ContentSource,
}

/// Response from the Q&A pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct QnaResponse {
    pub request_id: Uuid,
    pub titles: Vec<String>,
    pub questions: Vec<String>,
    pub answers: Vec<String>,
    pub comments: Vec<String>,
    pub keywords: Vec<String>,
    pub seo_score: i32,
    pub audit: AuditResult,
    pub attempts: u32,
    pub source: ContentSource,
    pub facts: Vec<String>,
    pub strategy: StrategyPlan,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub design: Option<ImageOutcome>,
    pub generated_at: DateTime<Utc>,
}

// ────────────────────────────────────────────────────────────────────────────
// Pipeline
// ────────────────────────────────────────────────────────────────────────────

/// Runs the full Q&A pipeline.
///
/// Steps:
/// 1. blog + news search, issued concurrently → facts
/// 2. plan_strategy() → StrategyPlan
/// 3. generate_with_self_audit() → DraftOutcome
/// 4. design image when requested
pub async fn generate_qna(
    llm: &dyn TextGenerator,
    auditor: &dyn ContentAuditor,
    search: &NaverSearchClient,
    images: &ImageClient,
    request: GenerationRequest,
) -> Result<QnaResponse, AppError> {
    request.validate()?;
    let request_id = Uuid::new_v4();
    let target = request.target_or_default().to_string();
    let insurance_type = request.insurance_type.trim().to_string();
    let concern = request.concern.trim().to_string();

    // Step 1: search
    info!("[{request_id}] Searching facts for {insurance_type:?}");
    let blog_query = format!("{insurance_type} {concern}");
    let (blog, news) = tokio::join!(
        search.search_or_empty(SearchKind::Blog, &blog_query),
        search.search_or_empty(SearchKind::News, &insurance_type),
    );
    let facts = merge_facts(&blog, &news);

    // Step 2: strategy
    let plan = plan_strategy(llm, &target, &insurance_type, &concern, &facts).await?;
    info!(
        "[{request_id}] Strategy ready: {} keywords, {} facts",
        plan.seo_keywords.len(),
        plan.facts.len()
    );

    // Step 3: draft + self-audit
    let ctx = AuditContext {
        concern: concern.clone(),
        insurance_type: insurance_type.clone(),
        target: target.clone(),
        seo_keywords: plan.seo_keywords.clone(),
        fact_checks: plan.facts.clone(),
    };
    let styles = parse_tones(&request.tone);
    let persona = persona_block(&styles);
    let knowledge = knowledge_block(&insurance_type);
    let build_prompt = |fixes: &[String]| {
        build_qna_prompt(&persona, &knowledge, &target, &insurance_type, &concern, &plan, fixes)
    };
    let fallback = || canned_content(&target, &insurance_type, &concern, &plan);

    let outcome =
        generate_with_self_audit(llm, auditor, &build_prompt, &fallback, &ctx, &plan.seo_keywords)
            .await?;
    info!(
        "[{request_id}] Draft finished: score={} passed={} attempts={} source={:?}",
        outcome.audit.overall, outcome.audit.passed, outcome.attempts, outcome.source
    );

    // Step 4: optional design image
    let design = if request.generate_design {
        let title = outcome.content.titles.first().cloned().unwrap_or_default();
        let prompt = design_image_prompt(&title, &insurance_type);
        Some(match images.generate(&prompt).await {
            Ok(image) => image,
            Err(e) => {
                warn!("[{request_id}] Design image skipped: {e}");
                ImageOutcome::failure(format!("디자인 이미지를 만들 수 없습니다: {e}"), 0)
            }
        })
    } else {
        None
    };

    let DraftOutcome {
        content,
        audit,
        attempts,
        source,
    } = outcome;

    Ok(QnaResponse {
        request_id,
        titles: content.titles,
        questions: content.questions,
        answers: content.answers,
        comments: content.comments,
        keywords: content.keywords,
        seo_score: audit.seo_score,
        audit,
        attempts,
        source,
        facts,
        strategy: plan,
        design,
        generated_at: Utc::now(),
    })
}

/// Draft → audit → regenerate, at most `MAX_REGENERATION_ATTEMPTS + 1` calls.
///
/// Iterations are strictly sequential: attempt N's prompt carries the fix list
/// of the worst audit seen so far. The loop stops on the first pass. The last
/// parsed attempt is returned even if it never passes; if no attempt produced
/// content, `fallback` supplies canned content.
pub async fn generate_with_self_audit(
    llm: &dyn TextGenerator,
    auditor: &dyn ContentAuditor,
    build_prompt: &(dyn Fn(&[String]) -> String + Sync),
    fallback: &(dyn Fn() -> GeneratedContent + Sync),
    ctx: &AuditContext,
    fallback_keywords: &[String],
) -> Result<DraftOutcome, AppError> {
    let mut last: Option<(GeneratedContent, AuditResult)> = None;
    let mut worst: Option<AuditResult> = None;
    let mut format_broken = false;
    let mut degrade: Option<DegradeReason> = None;
    let mut attempts = 0u32;

    for attempt in 0..=MAX_REGENERATION_ATTEMPTS {
        let mut fixes = worst.as_ref().map(AuditResult::fix_list).unwrap_or_default();
        if format_broken {
            fixes.insert(0, FORMAT_FIX_REASON.to_string());
        }
        let prompt = build_prompt(&fixes);

        attempts += 1;
        let reply = match llm.generate(&prompt, QNA_SYSTEM).await {
            Ok(reply) => reply,
            Err(LlmError::NoCredentials) => return Err(AppError::missing_keys()),
            Err(e) => {
                let reason = DegradeReason::from(&e);
                warn!(
                    "Draft attempt {}/{} degraded ({reason:?}): {e}",
                    attempt + 1,
                    MAX_REGENERATION_ATTEMPTS + 1
                );
                degrade = Some(reason);
                if reason == DegradeReason::Unavailable {
                    break;
                }
                continue;
            }
        };

        let sections = Sections::parse(&reply);
        if sections.is_empty() {
            warn!(
                "Draft attempt {}/{} degraded (Malformed): no section tags in {} chars",
                attempt + 1,
                MAX_REGENERATION_ATTEMPTS + 1,
                reply.chars().count()
            );
            degrade = Some(DegradeReason::Malformed);
            format_broken = true;
            continue;
        }
        format_broken = false;

        let content = GeneratedContent::from_sections(&sections, fallback_keywords);
        let audit = auditor.audit(&content, ctx);
        info!(
            "Draft attempt {}/{}: overall={} passed={} fail_reasons={}",
            attempt + 1,
            MAX_REGENERATION_ATTEMPTS + 1,
            audit.overall,
            audit.passed,
            audit.fail_reasons.len()
        );

        if worst.as_ref().map_or(true, |w| audit.overall < w.overall) {
            worst = Some(audit.clone());
        }
        let passed = audit.passed;
        last = Some((content, audit));
        if passed {
            break;
        }
    }

    match last {
        Some((content, audit)) => Ok(DraftOutcome {
            content,
            audit,
            attempts,
            source: ContentSource::Model,
        }),
        None => {
            let reason = degrade.unwrap_or(DegradeReason::Unavailable);
            warn!("No usable draft after {attempts} attempts, serving canned content ({reason:?})");
            let content = fallback();
            let audit = auditor.audit(&content, ctx);
            Ok(DraftOutcome {
                content,
                audit,
                attempts,
                source: ContentSource::Fallback(reason),
            })
        }
    }
}

/// Builds the draft prompt by filling the template.
pub fn build_qna_prompt(
    persona: &str,
    knowledge: &str,
    target: &str,
    insurance_type: &str,
    concern: &str,
    plan: &StrategyPlan,
    fixes: &[String],
) -> String {
    let strategies = plan
        .expert_strategies
        .iter()
        .enumerate()
        .map(|(i, s)| format!("- 전문가{}: {}", i + 1, s))
        .collect::<Vec<_>>()
        .join("\n");

    fill_template(
        QNA_PROMPT_TEMPLATE,
        &[
            ("fix_block", &fix_block(fixes)),
            ("persona_block", persona),
            ("knowledge_block", knowledge),
            ("target", &quoted(target)),
            ("insurance_type", &quoted(insurance_type)),
            ("concern", &quoted(concern)),
            ("seo_keywords", &plan.seo_keywords.join(", ")),
            ("facts", &bullet_lines(&plan.facts, "일반적으로 알려진 제도 사실만 사용")),
            ("strategies", &strategies),
            ("compliance", COMPLIANCE_INSTRUCTION),
            ("tag_format", TAG_FORMAT_INSTRUCTION),
        ],
    )
}

/// Interleaves blog and news hits into unique fact lines.
fn merge_facts(blog: &[SearchItem], news: &[SearchItem]) -> Vec<String> {
    let mut facts: Vec<String> = Vec::new();
    let longest = blog.len().max(news.len());
    for i in 0..longest {
        for item in [blog.get(i), news.get(i)].into_iter().flatten() {
            let fact = item.as_fact();
            if !facts.contains(&fact) {
                facts.push(fact);
            }
        }
    }
    facts.truncate(MAX_SEARCH_FACTS);
    facts
}

/// Canned post served when the model never produced usable content.
pub fn canned_content(
    target: &str,
    insurance_type: &str,
    concern: &str,
    plan: &StrategyPlan,
) -> GeneratedContent {
    let knowledge = crate::generation::knowledge::domain_knowledge(insurance_type);
    let coverage = knowledge.coverage_items.join(", ");
    let cautions = knowledge.cautions.join(", ");

    GeneratedContent {
        titles: vec![
            format!("{insurance_type} 가입 전에 꼭 확인해야 할 것들이 궁금해요"),
            format!("{insurance_type}, 지금 가입한 걸로 충분할까요?"),
            format!("{target}인데 {insurance_type} 어떻게 준비해야 하나요?"),
        ],
        questions: vec![format!(
            "안녕하세요. {target}입니다. {concern} {insurance_type}을(를) 알아보고 있는데 \
             어떤 보장을 우선으로 봐야 할지 모르겠습니다. 조언 부탁드립니다."
        )],
        answers: vec![
            format!(
                "{concern} 이런 고민이라면 {insurance_type}의 보장 범위부터 정리해 보시는 게 좋습니다. \
                 주요 보장은 {coverage} 정도로 나뉘고, 가입 시에는 {cautions} 같은 부분을 꼭 확인하셔야 합니다. \
                 보장 내용은 상품과 약관에 따라 다를 수 있으니 현재 가입된 보험 증권을 먼저 점검해 보시고 \
                 필요하면 전문가 상담을 받아 보시길 권해 드립니다."
            ),
            format!(
                "보험료 측면에서 보면 {insurance_type}은 갱신형과 비갱신형, 납입 기간에 따라 총 납입액 차이가 큽니다. \
                 같은 보장이라도 구성 방법에 따라 부담이 달라지니 여러 회사 상품을 비교해 보시는 게 좋습니다. \
                 {target}이시라면 지출 계획에 맞춰 납입 기간을 정하시고 궁금한 점은 문의 주시면 함께 설계해 드리겠습니다."
            ),
            format!(
                "비슷한 고민으로 상담하셨던 분들도 처음에는 무엇부터 봐야 할지 막막해하셨습니다. \
                 실제로는 기존 보험과 겹치는 보장을 정리하고 부족한 부분만 보완하는 것만으로도 충분한 경우가 많았습니다. \
                 {insurance_type} 가입 전 고지의무와 면책기간을 확인하시고, 상담을 통해 본인 상황에 맞게 점검해 보세요."
            ),
        ],
        comments: vec![
            format!("저도 {insurance_type} 때문에 비슷한 고민을 하고 있었어요"),
            "기존 보험이랑 겹치는 보장이 있는지 먼저 봐야겠네요".to_string(),
            "갱신형이랑 비갱신형 차이를 이번에 처음 알았어요".to_string(),
        ],
        keywords: plan.seo_keywords.clone(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
