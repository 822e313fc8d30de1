//! Markdown → HTML for model-written documents (digests, summaries).
//!
//! Supports the block dialect models actually produce: headings, bullet
//! lists, quotes, rules, fenced code and paragraphs. Conversion is a single
//! pass over lines with three modes: normal, inside a list, inside a fence.

use std::sync::LazyLock;

use regex::Regex;

use crate::inline::{escape_html, inline_markdown};

/// Output heading levels are shifted down one and clamped to this range.
const MIN_HEADING: usize = 2;
const MAX_HEADING: usize = 4;

/// Convert a Markdown document to an HTML fragment, one element per line.
pub fn markdown_to_html(md: &str) -> String {
    static RULE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^-{3,}$").expect("valid regex"));
    static HEADING_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^(#{1,4})\s+(.+)$").expect("valid regex"));
    static LIST_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^[-*]\s+(.+)$").expect("valid regex"));

    let mut out = Writer::default();

    for line in md.lines() {
        let stripped = line.trim();

        if stripped.starts_with("```") {
            if out.in_code {
                out.close_code();
            } else {
                out.close_list();
                out.in_code = true;
            }
            continue;
        }

        if out.in_code {
            out.code.push(line.to_string());
            continue;
        }

        if stripped.is_empty() {
            out.close_list();
            continue;
        }

        if RULE_RE.is_match(stripped) {
            out.close_list();
            out.push("<hr>".to_string());
            continue;
        }

        if let Some(caps) = HEADING_RE.captures(stripped) {
            out.close_list();
            let level = (caps[1].len() + 1).clamp(MIN_HEADING, MAX_HEADING);
            out.push(format!("<h{level}>{}</h{level}>", inline_markdown(&caps[2])));
            continue;
        }

        if stripped == ">" || stripped.starts_with("> ") {
            out.close_list();
            let quote = stripped.strip_prefix("> ").unwrap_or("");
            out.push(format!("<blockquote>{}</blockquote>", inline_markdown(quote)));
            continue;
        }

        if let Some(caps) = LIST_RE.captures(stripped) {
            if !out.in_list {
                out.push("<ul>".to_string());
                out.in_list = true;
            }
            out.push(format!("<li>{}</li>", inline_markdown(&caps[1])));
            continue;
        }

        out.close_list();
        out.push(format!("<p>{}</p>", inline_markdown(stripped)));
    }

    out.finish()
}

#[derive(Default)]
struct Writer {
    lines: Vec<String>,
    in_list: bool,
    in_code: bool,
    code: Vec<String>,
}

impl Writer {
    fn push(&mut self, html: String) {
        self.lines.push(html);
    }

    fn close_list(&mut self) {
        if self.in_list {
            self.lines.push("</ul>".to_string());
            self.in_list = false;
        }
    }

    fn close_code(&mut self) {
        let body = escape_html(&self.code.join("\n"));
        self.lines.push(format!("<pre><code>{body}</code></pre>"));
        self.code.clear();
        self.in_code = false;
    }

    fn finish(mut self) -> String {
        if self.in_code {
            self.close_code();
        }
        self.close_list();
        self.lines.join("\n")
    }
}
