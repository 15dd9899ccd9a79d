//! Domain knowledge blocks keyed by insurance type.
//!
//! Selection is a substring match on the free-text insurance-type label, most
//! specific entries first. Anything unmatched gets the generic block.

/// Fixed reference material for one insurance category.
#[derive(Debug)]
pub struct DomainKnowledge {
    pub name: &'static str,
    pub match_terms: &'static [&'static str],
    pub summary: &'static str,
    pub coverage_items: &'static [&'static str],
    pub cautions: &'static [&'static str],
}

pub static KNOWLEDGE_TABLE: &[DomainKnowledge] = &[
    DomainKnowledge {
        name: "실손보험",
        match_terms: &["실손", "실비"],
        summary: "실제 부담한 의료비를 보상하는 보험. 세대별로 자기부담률과 비급여 보장 방식이 다르다.",
        coverage_items: &["입원 의료비", "통원 의료비", "처방 조제비", "비급여 도수치료(특약)"],
        cautions: &[
            "4세대 실손은 비급여 이용량에 따라 보험료가 할증될 수 있음",
            "중복 가입해도 실제 손해액 이상은 보상되지 않음",
        ],
    },
    DomainKnowledge {
        name: "치아보험",
        match_terms: &["치아", "임플란트"],
        summary: "충전·보철·임플란트 등 치과 치료비를 보장하는 보험. 면책·감액 기간이 핵심.",
        coverage_items: &["충전 치료", "크라운", "임플란트", "브릿지"],
        cautions: &["가입 직후 면책기간(보통 90일~1년)", "감액기간 동안 50% 지급"],
    },
    DomainKnowledge {
        name: "운전자보험",
        match_terms: &["운전자", "자동차"],
        summary: "자동차보험이 보장하지 않는 형사·행정 책임 비용을 보장하는 보험.",
        coverage_items: &["교통사고처리지원금", "변호사선임비용", "벌금", "자동차사고부상치료비"],
        cautions: &["민식이법 등 법 개정 반영 여부 확인", "중복 가입 시 비례 보상 항목 존재"],
    },
    DomainKnowledge {
        name: "간병·치매보험",
        match_terms: &["간병", "치매", "요양"],
        summary: "장기요양 등급 판정이나 치매 진단 시 간병비·생활비를 지급하는 보험.",
        coverage_items: &["치매 진단비", "장기요양 간병비", "간병인 사용 일당"],
        cautions: &["경증 치매 보장 여부 확인", "지급 조건이 CDR 척도 기준인지 확인"],
    },
    DomainKnowledge {
        name: "어린이보험",
        match_terms: &["어린이", "태아", "자녀"],
        summary: "태아·자녀의 질병과 상해를 폭넓게 보장하는 보험. 만기와 납입 기간 설계가 중요.",
        coverage_items: &["선천이상 수술비", "입원 일당", "골절 진단비", "배상책임"],
        cautions: &["태아 특약은 출생 전 가입해야 함", "30세 만기와 100세 만기 보험료 차이"],
    },
    DomainKnowledge {
        name: "연금보험",
        match_terms: &["연금", "노후"],
        summary: "노후 소득을 마련하는 저축성 보험. 세제 혜택과 사업비 구조를 함께 봐야 한다.",
        coverage_items: &["종신형 연금", "확정기간형 연금", "세액공제(연금저축)"],
        cautions: &["조기 해지 시 원금 손실 가능", "10년 유지 비과세 요건"],
    },
    DomainKnowledge {
        name: "종신보험",
        match_terms: &["종신", "사망"],
        summary: "기간 제한 없이 사망을 보장하는 보험. 상속·유족 생활비 설계에 쓰인다.",
        coverage_items: &["일반사망 보험금", "재해사망 특약", "납입면제"],
        cautions: &["저축 목적이라면 해지환급금 구조 확인", "정기보험 대비 보험료 수준 비교"],
    },
    DomainKnowledge {
        name: "암보험",
        match_terms: &["암", "cancer"],
        summary: "암 진단 시 목돈을 지급하고 치료비를 보장하는 보험. 진단비와 치료비 특약 구성이 핵심.",
        coverage_items: &["일반암 진단비", "유사암 진단비", "표적항암 치료비", "암 수술비"],
        cautions: &["가입 후 90일 면책기간", "1년 내 진단 시 50% 감액", "유사암은 진단비가 10~20% 수준"],
    },
];

pub static GENERIC_KNOWLEDGE: DomainKnowledge = DomainKnowledge {
    name: "보험 일반",
    match_terms: &[],
    summary: "보장 범위, 보험료, 납입 기간, 갱신 여부를 함께 비교해야 한다.",
    coverage_items: &["주계약 보장", "선택 특약", "납입면제"],
    cautions: &["갱신형은 보험료가 오를 수 있음", "고지의무 위반 시 보험금 부지급 가능"],
};

pub fn domain_knowledge(insurance_type: &str) -> &'static DomainKnowledge {
    let label = insurance_type.trim().to_lowercase();
    KNOWLEDGE_TABLE
        .iter()
        .find(|k| k.match_terms.iter().any(|t| label.contains(t)))
        .unwrap_or(&GENERIC_KNOWLEDGE)
}

/// Renders the knowledge section of a prompt.
pub fn knowledge_block(insurance_type: &str) -> String {
    let k = domain_knowledge(insurance_type);
    format!(
        "[상품 기본 지식: {}]\n- 개요: {}\n- 주요 보장: {}\n- 주의할 점: {}",
        k.name,
        k.summary,
        k.coverage_items.join(", "),
        k.cautions.join(" / ")
    )
}

/// Category names offered by the frontend.
pub fn insurance_type_names() -> Vec<&'static str> {
    KNOWLEDGE_TABLE.iter().map(|k| k.name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substring_selects_block() {
        assert_eq!(domain_knowledge("4세대 실비").name, "실손보험");
        assert_eq!(domain_knowledge("유병자 암보험").name, "암보험");
        assert_eq!(domain_knowledge("태아보험").name, "어린이보험");
        assert_eq!(domain_knowledge("치매 간병").name, "간병·치매보험");
    }

    #[test]
    fn test_unknown_type_gets_generic_block() {
        assert_eq!(domain_knowledge("펫보험").name, GENERIC_KNOWLEDGE.name);
        assert_eq!(domain_knowledge("").name, GENERIC_KNOWLEDGE.name);
    }

    #[test]
    fn test_every_category_is_selectable_by_its_name() {
        for name in insurance_type_names() {
            assert_eq!(domain_knowledge(name).name, name, "category {name}");
        }
    }

    #[test]
    fn test_knowledge_block_lists_coverage() {
        let block = knowledge_block("치아보험");
        assert!(block.contains("임플란트"));
        assert!(block.contains("면책기간"));
    }
}
