//! Prompt builders for the image model.

use serde::Deserialize;

use crate::generation::knowledge::domain_knowledge;

/// Fields of a simulated insurance proposal document.
#[derive(Debug, Clone, Deserialize)]
pub struct ProposalImageRequest {
    pub company: String,
    pub insurance_type: String,
    pub customer_name: String,
    #[serde(default)]
    pub customer_age: Option<u32>,
    #[serde(default)]
    pub customer_gender: Option<String>,
    #[serde(default)]
    pub monthly_premium: Option<u32>,
}

/// Masks a customer name for display on the document: 홍길동 → 홍*동.
pub fn mask_name(name: &str) -> String {
    let chars: Vec<char> = name.trim().chars().collect();
    match chars.len() {
        0 => String::new(),
        1 => "*".to_string(),
        2 => format!("{}*", chars[0]),
        n => {
            let mut masked = String::new();
            masked.push(chars[0]);
            masked.extend(std::iter::repeat('*').take(n - 2));
            masked.push(chars[n - 1]);
            masked
        }
    }
}

pub fn proposal_image_prompt(req: &ProposalImageRequest) -> String {
    let knowledge = domain_knowledge(&req.insurance_type);
    let age = req
        .customer_age
        .map(|a| format!("{a}세"))
        .unwrap_or_else(|| "미기재".to_string());
    let gender = req
        .customer_gender
        .as_deref()
        .filter(|g| !g.trim().is_empty())
        .unwrap_or("미기재");
    let premium = req
        .monthly_premium
        .map(|p| format!("월 {}원", format_won(p)))
        .unwrap_or_else(|| "상담 후 산출".to_string());

    format!(
        r#"한국 보험회사의 '보험 가입 설계서' 문서를 촬영한 듯한 사실적인 이미지를 만들어 주세요.

[문서 구성]
- 상단 로고 영역: "{company}"
- 문서 제목: "{insurance_type} 가입 설계서"
- 고객 정보 표: 고객명 "{customer}", 나이 {age}, 성별 {gender}
- 보장 내역 표: {coverage}
- 하단 합계: 예상 보험료 {premium}
- 우측 하단: "본 설계서는 이해를 돕기 위한 예시이며 실제 보장은 약관에 따릅니다"

[스타일]
- A4 흰 종이, 깔끔한 표, 파란색/회색 계열
- 사무실 책상 위에 놓인 모습, 자연광
- 한글 텍스트는 또렷하게, 실제 개인정보는 넣지 마세요"#,
        company = req.company.trim(),
        insurance_type = req.insurance_type.trim(),
        customer = mask_name(&req.customer_name),
        age = age,
        gender = gender,
        coverage = knowledge.coverage_items.join(", "),
        premium = premium,
    )
}

/// Cover image for a generated Q&A post.
pub fn design_image_prompt(title: &str, insurance_type: &str) -> String {
    format!(
        r#"보험 정보 블로그의 대표 이미지를 만들어 주세요.
- 주제: "{insurance_type}"
- 글 제목: "{title}"
- 밝고 신뢰감 있는 일러스트, 파란색 계열, 16:9
- 이미지 안에 글자는 넣지 마세요"#,
        insurance_type = insurance_type.trim(),
        title = title.trim(),
    )
}

/// 1234567 → "1,234,567"
fn format_won(amount: u32) -> String {
    let digits = amount.to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
