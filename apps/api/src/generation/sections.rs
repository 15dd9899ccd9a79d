//! Bracket-tag parser for free-text model replies.
//!
//! The model is told to open every section with a marker such as `[제목1]` or
//! `[답변2]`. The reply is tokenized on known markers into ordered
//! `(tag, body)` pairs, so sections may arrive in any order and unknown
//! bracketed text stays part of the surrounding body.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Tag base names the tokenizer splits on.
pub const KNOWN_TAGS: &[&str] = &[
    "제목", "질문", "답변", "댓글", "키워드", "본문", "해시태그", "요약",
];

pub const MAX_TITLES: usize = 3;
pub const MAX_QUESTIONS: usize = 3;
pub const MAX_ANSWERS: usize = 3;
pub const MAX_COMMENTS: usize = 5;

pub const FALLBACK_TITLE: &str = "보험 가입 전에 꼭 확인해야 할 점이 궁금합니다";
pub const FALLBACK_QUESTION: &str =
    "보험 가입을 고민하고 있는데 어떤 부분을 먼저 확인해야 할지 모르겠습니다. 조언 부탁드립니다.";
pub const FALLBACK_ANSWER: &str =
    "답변을 준비하지 못했습니다. 보장 내용과 보험료는 가입 조건에 따라 달라지므로 전문가 상담을 통해 확인해 보시길 권해 드립니다.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub tag: String,
    pub body: String,
}

/// Ordered list of tagged sections from one reply.
#[derive(Debug, Clone, Default)]
pub struct Sections(Vec<Section>);

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let names = KNOWN_TAGS.join("|");
        Regex::new(&format!(r"\*{{0,2}}\[\s*({names})\s*(\d*)\s*\]\*{{0,2}}"))
            .expect("valid section tag regex")
    })
}

fn emoji_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"[\x{1F000}-\x{1FAFF}\x{2600}-\x{27BF}\x{2B00}-\x{2BFF}\x{FE0F}\x{200D}\x{20E3}]",
        )
        .expect("valid emoji regex")
    })
}

fn line_markup_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^[ \t]*(?:#{1,6}[ \t]*|>[ \t]*|[-*+][ \t]+)").expect("valid markup regex")
    })
}

fn blank_run_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{3,}").expect("valid blank-run regex"))
}

/// Strips emoji and markdown punctuation, collapses blank-line runs, trims.
pub fn clean_text(raw: &str) -> String {
    let text = emoji_regex().replace_all(raw, "");
    let text = line_markup_regex().replace_all(&text, "");
    let text = text.replace("**", "").replace("__", "").replace('`', "");
    let text = text.replace('*', "");
    let text: String = text
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n");
    blank_run_regex()
        .replace_all(&text, "\n\n")
        .trim()
        .to_string()
}

impl Sections {
    /// Splits `reply` on known tags. Text before the first tag is dropped.
    pub fn parse(reply: &str) -> Self {
        let re = tag_regex();
        let mut sections = Vec::new();
        let mut current: Option<(String, usize)> = None;

        for caps in re.captures_iter(reply) {
            let Some(whole) = caps.get(0) else { continue };
            if let Some((tag, start)) = current.take() {
                sections.push(Section {
                    tag,
                    body: clean_text(&reply[start..whole.start()]),
                });
            }
            let base = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let number = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
            current = Some((format!("{base}{number}"), whole.end()));
        }

        if let Some((tag, start)) = current {
            sections.push(Section {
                tag,
                body: clean_text(&reply[start..]),
            });
        }

        Sections(sections)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First non-empty body for an exact tag.
    pub fn get(&self, tag: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|s| s.tag == tag && !s.body.is_empty())
            .map(|s| s.body.as_str())
    }

    /// Bodies of `base1..=baseN` in numeric order. When the model used no
    /// numbers at all, every un-numbered `base` section is returned instead.
    pub fn numbered(&self, base: &str, max: usize) -> Vec<String> {
        let numbered: Vec<String> = (1..=max)
            .filter_map(|i| self.get(&format!("{base}{i}")))
            .map(str::to_string)
            .collect();
        if !numbered.is_empty() {
            return numbered;
        }
        self.0
            .iter()
            .filter(|s| s.tag == base && !s.body.is_empty())
            .take(max)
            .map(|s| s.body.clone())
            .collect()
    }
}

/// Splits a keyword/hashtag section on commas, `#` and line breaks.
pub fn split_keywords(raw: &str, limit: usize) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for part in raw.split([',', '#', '\n', '、']) {
        let kw = part.trim();
        if !kw.is_empty() && !out.iter().any(|k| k == kw) {
            out.push(kw.to_string());
        }
        if out.len() == limit {
            break;
        }
    }
    out
}

/// Parsed Q&A post. Every list is non-null; titles, questions and answers are
/// never empty (canned strings stand in for missing sections).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedContent {
    pub titles: Vec<String>,
    pub questions: Vec<String>,
    pub answers: Vec<String>,
    pub comments: Vec<String>,
    pub keywords: Vec<String>,
}

impl GeneratedContent {
    pub fn from_sections(sections: &Sections, fallback_keywords: &[String]) -> Self {
        let or_fallback = |mut items: Vec<String>, fallback: &str| {
            if items.is_empty() {
                items.push(fallback.to_string());
            }
            items
        };

        let keywords = sections
            .get("키워드")
            .map(|raw| split_keywords(raw, 10))
            .filter(|k| !k.is_empty())
            .unwrap_or_else(|| fallback_keywords.to_vec());

        GeneratedContent {
            titles: or_fallback(sections.numbered("제목", MAX_TITLES), FALLBACK_TITLE),
            questions: or_fallback(sections.numbered("질문", MAX_QUESTIONS), FALLBACK_QUESTION),
            answers: or_fallback(sections.numbered("답변", MAX_ANSWERS), FALLBACK_ANSWER),
            comments: sections.numbered("댓글", MAX_COMMENTS),
            keywords,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjacent_tags_stop_at_next_known_tag() {
        let sections = Sections::parse("[제목1]Hello[제목2]World[질문1]Q1");
        assert_eq!(sections.get("제목1"), Some("Hello"));
        assert_eq!(sections.get("제목2"), Some("World"));
        assert_eq!(sections.get("질문1"), Some("Q1"));
        assert_eq!(sections.0.len(), 3);
    }

    #[test]
    fn test_out_of_order_tags_are_still_found() {
        let sections = Sections::parse("[답변2] 둘째\n[답변1] 첫째\n[제목1] 제목");
        assert_eq!(sections.numbered("답변", 3), vec!["첫째", "둘째"]);
        assert_eq!(sections.get("제목1"), Some("제목"));
    }

    #[test]
    fn test_unknown_brackets_stay_in_body() {
        let sections = Sections::parse("[답변1] 핵심은 [참고] 약관입니다 [댓글1] 좋아요");
        assert_eq!(sections.get("답변1"), Some("핵심은 [참고] 약관입니다"));
        assert_eq!(sections.get("댓글1"), Some("좋아요"));
    }

    #[test]
    fn test_bold_wrapped_tags_and_preamble() {
        let sections = Sections::parse("네, 작성해 드릴게요.\n**[제목1]** 암보험 진단비\n**[ 질문 1 ]** 궁금해요");
        assert_eq!(sections.get("제목1"), Some("암보험 진단비"));
        assert_eq!(sections.get("질문1"), Some("궁금해요"));
    }

    #[test]
    fn test_unnumbered_repeated_tags() {
        let sections = Sections::parse("[댓글] 하나 [댓글] 둘 [댓글] 셋");
        assert_eq!(sections.numbered("댓글", 5), vec!["하나", "둘", "셋"]);
    }

    #[test]
    fn test_clean_text_strips_emoji_and_markdown() {
        let raw = "## 핵심 정리 😀\n- **진단비**는 `중요`합니다 ✅\n> 인용\n\n\n\n끝";
        assert_eq!(clean_text(raw), "핵심 정리\n진단비는 중요합니다\n인용\n\n끝");
    }

    #[test]
    fn test_clean_text_keeps_square_subheadings() {
        assert_eq!(clean_text("■ 소제목\n본문"), "■ 소제목\n본문");
    }

    #[test]
    fn test_split_keywords_dedups_and_limits() {
        assert_eq!(
            split_keywords("#암보험 #진단비, 암보험\n표적항암", 10),
            vec!["암보험", "진단비", "표적항암"]
        );
        assert_eq!(split_keywords("a,b,c,d", 2), vec!["a", "b"]);
    }

    #[test]
    fn test_missing_sections_get_fallbacks_but_comments_may_be_empty() {
        let content = GeneratedContent::from_sections(&Sections::parse("[답변1] 답"), &["kw".to_string()]);
        assert_eq!(content.titles, vec![FALLBACK_TITLE]);
        assert_eq!(content.questions, vec![FALLBACK_QUESTION]);
        assert_eq!(content.answers, vec!["답"]);
        assert!(content.comments.is_empty());
        assert_eq!(content.keywords, vec!["kw"]);
    }

    #[test]
    fn test_full_reply_parses_every_list() {
        let reply = "[제목1] t1 [제목2] t2 [제목3] t3 [질문1] q \
                     [답변1] a1 [답변2] a2 [답변3] a3 \
                     [댓글1] c1 [댓글2] c2 [댓글3] c3 [댓글4] c4 [댓글5] c5 \
                     [키워드] 암보험, 진단비";
        let content = GeneratedContent::from_sections(&Sections::parse(reply), &[]);
        assert_eq!(content.titles.len(), 3);
        assert_eq!(content.answers, vec!["a1", "a2", "a3"]);
        assert_eq!(content.comments.len(), 5);
        assert_eq!(content.keywords, vec!["암보험", "진단비"]);
    }
}
