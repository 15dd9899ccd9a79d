//! Strategy step: one JSON LLM call that turns the request and search facts
//! into SEO keywords, grounded facts, and per-expert answer strategies.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::AppError;
use crate::generation::prompts::{
    bullet_lines, fill_template, STRATEGY_PROMPT_TEMPLATE, STRATEGY_SYSTEM,
};
use crate::generation::DegradeReason;
use crate::llm_client::prompts::quoted;
use crate::llm_client::{call_json, LlmError, TextGenerator};

/// How many SEO keywords the audit looks at.
pub const SEO_KEYWORD_LIMIT: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategyPlan {
    #[serde(default)]
    pub seo_keywords: Vec<String>,
    #[serde(default)]
    pub facts: Vec<String>,
    #[serde(default)]
    pub expert_strategies: Vec<String>,
}

impl StrategyPlan {
    /// Deterministic plan used when the strategy call fails.
    pub fn fallback(insurance_type: &str, concern: &str, search_facts: &[String]) -> Self {
        let insurance_type = insurance_type.trim();
        let concern_head: String = concern.trim().chars().take(15).collect();
        let seo_keywords = vec![
            insurance_type.to_string(),
            format!("{insurance_type} 추천"),
            format!("{insurance_type} 비교"),
            format!("{insurance_type} 가입 시 주의사항"),
            concern_head,
        ];
        StrategyPlan {
            seo_keywords,
            facts: search_facts.iter().take(3).cloned().collect(),
            expert_strategies: vec![
                "보장 범위와 약관 조건을 중심으로 분석".to_string(),
                "보험료와 납입 구조를 비교해 비용 절감 방법 제시".to_string(),
                "비슷한 상담 사례를 들어 실제 준비 방법 안내".to_string(),
            ],
        }
    }

    /// Trims blanks and caps list sizes so downstream code sees bounded input.
    pub fn normalized(mut self) -> Self {
        let clean = |items: Vec<String>, limit: usize| -> Vec<String> {
            items
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .take(limit)
                .collect()
        };
        self.seo_keywords = clean(self.seo_keywords, SEO_KEYWORD_LIMIT);
        self.facts = clean(self.facts, 3);
        self.expert_strategies = clean(self.expert_strategies, 3);
        self
    }
}

pub fn build_strategy_prompt(
    target: &str,
    insurance_type: &str,
    concern: &str,
    search_facts: &[String],
) -> String {
    fill_template(
        STRATEGY_PROMPT_TEMPLATE,
        &[
            ("target", &quoted(target)),
            ("insurance_type", &quoted(insurance_type)),
            ("concern", &quoted(concern)),
            ("facts", &bullet_lines(search_facts, "검색 결과 없음")),
        ],
    )
}

/// Runs the strategy call. Upstream trouble degrades to the fallback plan;
/// only a missing key pool is returned as an error.
pub async fn plan_strategy(
    llm: &dyn TextGenerator,
    target: &str,
    insurance_type: &str,
    concern: &str,
    search_facts: &[String],
) -> Result<StrategyPlan, AppError> {
    let prompt = build_strategy_prompt(target, insurance_type, concern, search_facts);

    match call_json::<StrategyPlan>(llm, &prompt, STRATEGY_SYSTEM).await {
        Ok(plan) => {
            let plan = plan.normalized();
            if plan.seo_keywords.is_empty() {
                warn!("Strategy plan had no SEO keywords, using fallback plan");
                return Ok(StrategyPlan::fallback(insurance_type, concern, search_facts));
            }
            Ok(plan)
        }
        Err(LlmError::NoCredentials) => Err(AppError::missing_keys()),
        Err(e) => {
            let reason = DegradeReason::from(&e);
            warn!("Strategy step degraded ({reason:?}): {e}");
            Ok(StrategyPlan::fallback(insurance_type, concern, search_facts))
        }
    }
}
