// Shared prompt constants and prompt-building utilities.
// Each pipeline that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// Compliance rules appended to every content prompt.
pub const COMPLIANCE_INSTRUCTION: &str = "\
[준수 사항]
- 특정 보험사나 상품명을 단정적으로 추천하지 마세요.
- '무조건', '100% 보장', '최저가 보장' 같은 과장 표현을 쓰지 마세요.
- 보장 내용은 '약관에 따라 다를 수 있다'는 점을 자연스럽게 언급하세요.
- 실제 통계나 수치는 제공된 참고 자료에 있는 것만 사용하세요.";

/// Output-format rule shared by every bracket-tagged prompt.
pub const TAG_FORMAT_INSTRUCTION: &str = "\
[출력 형식]
- 각 항목은 반드시 대괄호 태그로 시작하세요. 예: [제목1], [질문1], [답변1]
- 태그 이름을 바꾸거나 생략하지 마세요.
- 이모지와 마크다운 기호(*, #, ```)는 사용하지 마세요.";

/// Wraps a user-supplied value as a quoted literal inside an instruction.
pub fn quoted(value: &str) -> String {
    format!("\"{}\"", value.trim())
}
