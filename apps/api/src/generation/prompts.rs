// All LLM prompt constants for the Generation module.
// Reuses cross-cutting fragments from llm_client::prompts.

/// System prompt for the strategy step: JSON only.
pub const STRATEGY_SYSTEM: &str = "당신은 보험 콘텐츠 SEO 전략가입니다. \
    사용자의 고민과 참고 자료를 분석해 콘텐츠 전략을 세웁니다. \
    반드시 유효한 JSON 객체 하나만 출력하세요. \
    JSON 바깥에 어떤 텍스트도 쓰지 마세요. \
    마크다운 코드 블록을 사용하지 마세요.";

/// Strategy prompt template.
/// Replace: {target}, {insurance_type}, {concern}, {facts}
pub const STRATEGY_PROMPT_TEMPLATE: &str = r#"다음 정보를 바탕으로 네이버 지식iN 스타일 Q&A 콘텐츠 전략을 세워 주세요.

- 타깃 고객: {target}
- 보험 종류: {insurance_type}
- 고객 고민: {concern}

[참고 자료]
{facts}

아래 스키마와 정확히 같은 JSON 객체를 반환하세요 (추가 필드 금지):
{
  "seo_keywords": ["검색 키워드 5개"],
  "facts": ["참고 자료에서 뽑은 사실 2~3개"],
  "expert_strategies": [
    "전문가1의 답변 전략 한 문장",
    "전문가2의 답변 전략 한 문장",
    "전문가3의 답변 전략 한 문장"
  ]
}

규칙:
1. seo_keywords는 실제 검색창에 입력할 법한 2~4단어 표현으로 정확히 5개
2. facts는 참고 자료에 있는 내용만 사용하고, 없으면 일반적으로 알려진 제도 사실만 사용
3. 세 전문가의 전략은 서로 다른 관점(보장 분석 / 비용 절감 / 실제 사례)으로 작성"#;

/// System prompt for Q&A drafting: free text with bracket tags.
pub const QNA_SYSTEM: &str = "당신은 네이버 지식iN에서 활동하는 보험 콘텐츠 작가입니다. \
    질문자와 서로 다른 세 명의 보험 전문가, 그리고 댓글 작성자를 모두 연기합니다. \
    지시한 대괄호 태그 형식을 반드시 지키세요.";

/// Q&A prompt template.
/// Replace: {fix_block}, {persona_block}, {knowledge_block}, {target},
///          {insurance_type}, {concern}, {seo_keywords}, {facts},
///          {strategies}, {compliance}, {tag_format}
pub const QNA_PROMPT_TEMPLATE: &str = r#"{fix_block}{persona_block}
{knowledge_block}

[요청]
- 타깃 고객: {target}
- 보험 종류: {insurance_type}
- 고객 고민: {concern}
- 반드시 자연스럽게 포함할 SEO 키워드: {seo_keywords}

[참고 사실]
{facts}

[전문가별 답변 전략]
{strategies}

{compliance}

{tag_format}

아래 순서와 태그로 작성하세요.
[제목1] 검색에 잘 걸리는 질문 제목 (보험 종류와 고민이 드러나게)
[제목2] 다른 표현의 제목
[제목3] 다른 표현의 제목
[질문1] 질문자 본문 (고객 고민을 1인칭으로 구체적으로, 200자 이상)
[답변1] 전문가1 답변 (400자 이상, 상담 권유 한 문장 포함)
[답변2] 전문가2 답변 (400자 이상, 다른 관점, 상담 권유 한 문장 포함)
[답변3] 전문가3 답변 (400자 이상, 다른 관점, 상담 권유 한 문장 포함)
[댓글1] 질문자와 비슷한 상황의 독자 댓글
[댓글2] 구체적인 경험이 담긴 댓글
[댓글3] 추가 질문이 담긴 댓글
[댓글4] 답변에 공감하는 댓글
[댓글5] 자신의 가입 경험을 공유하는 댓글
[키워드] 쉼표로 구분한 키워드 5개"#;

/// Fix block prepended on regeneration.
/// Replace: {reasons}
pub const FIX_BLOCK_TEMPLATE: &str = r#"[이전 결과의 문제점: 반드시 수정하세요]
{reasons}
위 문제를 모두 해결한 새 결과를 처음부터 다시 작성하세요.

"#;

/// System prompt for blog articles.
pub const BLOG_SYSTEM: &str = "당신은 네이버 블로그 상위 노출 경험이 많은 보험 블로거입니다. \
    정보성 글을 검색 친화적으로 작성하고 지시한 대괄호 태그 형식을 반드시 지킵니다.";

/// Blog prompt template.
/// Replace: {persona_block}, {knowledge_block}, {target}, {insurance_type},
///          {topic}, {facts}, {compliance}, {tag_format}
pub const BLOG_PROMPT_TEMPLATE: &str = r#"{persona_block}
{knowledge_block}

[요청]
- 타깃 독자: {target}
- 보험 종류: {insurance_type}
- 글 주제: {topic}

[참고 사실]
{facts}

{compliance}

{tag_format}

아래 태그로 작성하세요.
[제목] 메인 키워드 {insurance_type}이(가) 앞쪽에 들어간 블로그 제목
[본문] 1500자 이상 본문. 소제목은 '■ '로 시작하는 줄로 3개 이상 작성하고, 메인 키워드를 본문에 3~10회 자연스럽게 사용
[해시태그] #으로 시작하는 해시태그 5~10개"#;

/// Renders a list as "- item" lines, or a placeholder when empty.
pub fn bullet_lines(items: &[String], empty: &str) -> String {
    if items.is_empty() {
        return format!("- {empty}");
    }
    items
        .iter()
        .map(|i| format!("- {i}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Fills `{name}` placeholders in one left-to-right pass.
///
/// Inserted values are never rescanned, so user text that happens to look
/// like a placeholder stays literal. Unknown `{...}` spans are kept as-is.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let hit = tail.find('}').and_then(|close| {
            let name = &tail[1..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (close, *value))
        });
        match hit {
            Some((close, value)) => {
                out.push_str(value);
                rest = &tail[close + 1..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Builds the fix block from the reasons of the worst previous attempt.
pub fn fix_block(reasons: &[String]) -> String {
    if reasons.is_empty() {
        return String::new();
    }
    fill_template(FIX_BLOCK_TEMPLATE, &[("reasons", &bullet_lines(reasons, ""))])
}
