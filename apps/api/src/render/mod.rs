//! Server-rendered single-page frontend.
//!
//! The page shell lives in `templates/index.html`; the select options are
//! filled from the persona and knowledge tables so the UI never drifts from
//! what the prompt builder understands.

use axum::response::Html;

use crate::generation::knowledge::insurance_type_names;
use crate::generation::persona::ToneStyle;

const INDEX_TEMPLATE: &str = include_str!("../../templates/index.html");

/// Minimal HTML escaping for text and attribute values.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn options<'a>(values: impl IntoIterator<Item = &'a str>) -> String {
    values
        .into_iter()
        .map(|v| {
            let v = escape_html(v);
            format!("<option value=\"{v}\">{v}</option>")
        })
        .collect::<Vec<_>>()
        .join("\n          ")
}

pub fn render_index() -> String {
    INDEX_TEMPLATE
        .replace(
            "{{tone_options}}",
            &options(ToneStyle::ALL.iter().map(|s| s.label())),
        )
        .replace("{{insurance_options}}", &options(insurance_type_names()))
        .replace("{{version}}", env!("CARGO_PKG_VERSION"))
}

/// GET /
pub async fn index_handler() -> Html<String> {
    Html(render_index())
}
