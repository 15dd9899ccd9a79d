//! Scripted `TextGenerator` for pipeline tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::generation::audit::{AuditContext, AuditResult, ContentAuditor};
use crate::generation::sections::GeneratedContent;
use crate::llm_client::{LlmError, TextGenerator};

#[derive(Debug, Clone)]
pub enum Step {
    Reply(String),
    Unavailable,
    NoCredentials,
}

/// Replays a script of replies; the last step repeats once the script runs out.
pub struct ScriptedLlm {
    steps: Vec<Step>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn always(reply: &str) -> Self {
        Self::new(vec![Step::Reply(reply.to_string())])
    }

    pub fn unavailable() -> Self {
        Self::new(vec![Step::Unavailable])
    }

    pub fn no_credentials() -> Self {
        Self::new(vec![Step::NoCredentials])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedLlm {
    async fn generate(&self, prompt: &str, _system: &str) -> Result<String, LlmError> {
        let i = self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        let step = self
            .steps
            .get(i)
            .or_else(|| self.steps.last())
            .cloned()
            .unwrap_or(Step::Unavailable);
        match step {
            Step::Reply(text) => Ok(text),
            Step::Unavailable => Err(LlmError::KeysExhausted { attempts: 2 }),
            Step::NoCredentials => Err(LlmError::NoCredentials),
        }
    }
}

/// Auditor that fails every post with a fixed reason.
pub struct AlwaysFailAuditor;

pub const ALWAYS_FAIL_REASON: &str = "항상 실패";

impl ContentAuditor for AlwaysFailAuditor {
    fn audit(&self, _content: &GeneratedContent, _ctx: &AuditContext) -> AuditResult {
        AuditResult {
            seo_score: 0,
            context_score: 0,
            expert_score: 0,
            comment_score: 0,
            overall: 0,
            passed: false,
            fail_reasons: vec![ALWAYS_FAIL_REASON.to_string()],
            reasons: vec![ALWAYS_FAIL_REASON.to_string()],
            suggestions: vec![],
        }
    }
}

/// A reply that passes the heuristic audit for 암보험 / the concern below.
pub const GOOD_CONCERN: &str = "가족력이 있어서 암보험 진단비가 충분한지 걱정됩니다";

pub fn good_reply() -> String {
    let answer = |opening: &str| {
        let mut a = format!(
            "{opening} 가족력이 있으시다면 암보험 진단비를 먼저 점검해 보셔야 합니다. \
             일반암 진단비와 유사암 진단비 비율, 표적항암 치료비 특약까지 함께 보셔야 하고 \
             갱신형인지도 중요합니다. 암보험은 가입 후 90일 면책기간이 있습니다. "
        );
        while a.chars().count() < 320 {
            a.push_str("약관에 따라 보장 범위가 다를 수 있으니 꼼꼼히 보셔야 합니다. ");
        }
        a.push_str("궁금하시면 편하게 상담 요청 주세요.");
        a
    };
    format!(
        "[제목1] 가족력 있는데 암보험 진단비 얼마나 필요할까요?\n\
         [질문1] {GOOD_CONCERN}. 지금 보험으로 충분할까요?\n\
         [답변1] {}\n[답변2] {}\n[답변3] {}\n\
         [댓글1] 저도 아버지가 암 진단을 받으셔서 같은 고민이었어요\n\
         [댓글2] 유사암 비율은 처음 알았네요. 갱신형이면 많이 오르나요?\n\
         [댓글3] 표적항암 특약 넣을지 고민 중이었는데 상담 받아보려고요\n\
         [키워드] 암보험, 암 진단비, 가족력, 표적항암, 갱신형",
        answer("보장 분석 관점에서 말씀드리면,"),
        answer("보험료 절감 관점에서 보면,"),
        answer("실제 상담 사례를 하나 들어 보겠습니다."),
    )
}
