//! Tone calibration: maps the requested tone label to a writer persona.
//!
//! Labels are free text from the frontend ("친근한", "전문적인, 공감형" ...);
//! each recognized label selects one fixed persona block. Unknown labels fall
//! back to the friendly persona.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToneStyle {
    Friendly,
    Professional,
    Empathetic,
    Witty,
}

impl ToneStyle {
    pub const ALL: [ToneStyle; 4] = [
        ToneStyle::Friendly,
        ToneStyle::Professional,
        ToneStyle::Empathetic,
        ToneStyle::Witty,
    ];

    /// Display label used by the frontend select box.
    pub fn label(self) -> &'static str {
        match self {
            ToneStyle::Friendly => "친근한",
            ToneStyle::Professional => "전문적인",
            ToneStyle::Empathetic => "공감형",
            ToneStyle::Witty => "유머러스한",
        }
    }

    /// Substring match against the label table.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().to_lowercase();
        if label.is_empty() {
            return None;
        }
        if label.contains("친근") || label.contains("friendly") || label.contains("편안") {
            Some(ToneStyle::Friendly)
        } else if label.contains("전문") || label.contains("professional") || label.contains("신뢰")
        {
            Some(ToneStyle::Professional)
        } else if label.contains("공감") || label.contains("따뜻") || label.contains("empath") {
            Some(ToneStyle::Empathetic)
        } else if label.contains("유머") || label.contains("재치") || label.contains("witty") {
            Some(ToneStyle::Witty)
        } else {
            None
        }
    }
}

/// Persona block injected into prompts for one tone.
#[derive(Debug, Clone)]
pub struct PersonaTemplate {
    pub persona: &'static str,
    pub speech: &'static str,
    pub avoid: Vec<&'static str>,
}

pub fn persona_for(style: ToneStyle) -> PersonaTemplate {
    match style {
        ToneStyle::Friendly => PersonaTemplate {
            persona: "동네 언니·형처럼 편하게 설명해 주는 10년 차 보험 설계사",
            speech: "~해요, ~거든요 체를 쓰고 어려운 용어는 바로 풀어서 설명합니다",
            avoid: vec!["딱딱한 공문체", "전문 용어 나열"],
        },
        ToneStyle::Professional => PersonaTemplate {
            persona: "손해사정과 보험 설계를 모두 경험한 보험 전문가",
            speech: "~입니다, ~습니다 체로 근거와 약관 조항 위주로 정리합니다",
            avoid: vec!["과장된 감탄사", "근거 없는 단정"],
        },
        ToneStyle::Empathetic => PersonaTemplate {
            persona: "비슷한 고민을 직접 겪어 본 상담 경험 많은 설계사",
            speech: "먼저 고민에 공감한 뒤 차분하게 해결 방법을 안내합니다",
            avoid: vec!["훈계하는 말투", "불안감을 키우는 표현"],
        },
        ToneStyle::Witty => PersonaTemplate {
            persona: "어려운 보험 이야기를 쉬운 비유로 풀어내는 인기 블로거 설계사",
            speech: "가벼운 비유와 재치 있는 한 문장을 섞되 핵심 정보는 정확하게 전달합니다",
            avoid: vec!["비하성 농담", "가벼워 보이는 보장 설명"],
        },
    }
}

/// Parses a comma/slash separated tone field into styles, first = primary.
/// Duplicates are dropped; nothing recognized yields `[Friendly]`.
pub fn parse_tones(raw: &str) -> Vec<ToneStyle> {
    let mut styles: Vec<ToneStyle> = Vec::new();
    for label in raw.split([',', '/', '|']) {
        if let Some(style) = ToneStyle::from_label(label) {
            if !styles.contains(&style) {
                styles.push(style);
            }
        }
    }
    if styles.is_empty() {
        styles.push(ToneStyle::Friendly);
    }
    styles
}

/// Renders the persona section of a prompt for the requested tones.
pub fn persona_block(styles: &[ToneStyle]) -> String {
    let mut block = String::from("[작성자 페르소나]\n");
    for (i, style) in styles.iter().enumerate() {
        let p = persona_for(*style);
        let role = if i == 0 { "주 톤" } else { "보조 톤" };
        block.push_str(&format!(
            "- {role}({}): {}. {}. 피할 것: {}\n",
            style.label(),
            p.persona,
            p.speech,
            p.avoid.join(", ")
        ));
    }
    block
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_round_trip_through_from_label() {
        for style in ToneStyle::ALL {
            assert_eq!(ToneStyle::from_label(style.label()), Some(style));
        }
    }

    #[test]
    fn test_substring_labels_match() {
        assert_eq!(ToneStyle::from_label("아주 전문적인 느낌"), Some(ToneStyle::Professional));
        assert_eq!(ToneStyle::from_label("따뜻하게"), Some(ToneStyle::Empathetic));
        assert_eq!(ToneStyle::from_label("재치있게"), Some(ToneStyle::Witty));
        assert_eq!(ToneStyle::from_label("???"), None);
    }

    #[test]
    fn test_parse_tones_keeps_order_and_dedups() {
        let styles = parse_tones("공감형, 전문적인 / 공감");
        assert_eq!(styles, vec![ToneStyle::Empathetic, ToneStyle::Professional]);
    }

    #[test]
    fn test_parse_tones_defaults_to_friendly() {
        assert_eq!(parse_tones(""), vec![ToneStyle::Friendly]);
        assert_eq!(parse_tones("unknown"), vec![ToneStyle::Friendly]);
    }

    #[test]
    fn test_persona_block_marks_primary_tone() {
        let block = persona_block(&[ToneStyle::Professional, ToneStyle::Witty]);
        assert!(block.contains("주 톤(전문적인)"));
        assert!(block.contains("보조 톤(유머러스한)"));
    }

    #[test]
    fn test_every_persona_has_something_to_avoid() {
        for style in ToneStyle::ALL {
            assert!(!persona_for(style).avoid.is_empty());
        }
    }
}
