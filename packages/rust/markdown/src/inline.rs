//! Escaping and inline Markdown spans.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Escape text for use in HTML element content or a quoted attribute value.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render inline spans: escape first, then bold, code spans, and links.
///
/// The span patterns run over already-escaped text, so nothing in the input
/// can introduce a tag; only the tags inserted here are raw HTML.
pub fn inline_markdown(text: &str) -> String {
    static BOLD_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("valid regex"));
    static CODE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"`([^`]+)`").expect("valid regex"));
    static LINK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("valid regex"));

    let escaped = escape_html(text);
    let bold = BOLD_RE.replace_all(&escaped, "<strong>$1</strong>");
    let code = CODE_RE.replace_all(&bold, "<code>$1</code>");
    let linked = LINK_RE.replace_all(&code, |caps: &Captures<'_>| {
        let label = &caps[1];
        let href = caps[2].trim();
        if is_safe_href(href) {
            format!(r#"<a href="{href}" target="_blank">{label}</a>"#)
        } else {
            label.to_string()
        }
    });
    linked.into_owned()
}

/// Relative references and http(s)/mailto links only.
fn is_safe_href(href: &str) -> bool {
    let lower = href.to_ascii_lowercase();
    match lower.find(':') {
        None => true,
        Some(idx) => {
            let scheme = &lower[..idx];
            // A colon after a path, query or fragment start is not a scheme.
            if scheme.contains(['/', '?', '#']) {
                return true;
            }
            matches!(scheme, "http" | "https" | "mailto")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_all_special_characters() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#x27;s&lt;/a&gt;"
        );
    }

    #[test]
    fn bold_code_and_links() {
        assert_eq!(
            inline_markdown("**Rust** uses `cargo`, see [docs](https://doc.rust-lang.org)"),
            r#"<strong>Rust</strong> uses <code>cargo</code>, see <a href="https://doc.rust-lang.org" target="_blank">docs</a>"#
        );
    }

    #[test]
    fn markup_inside_spans_stays_escaped() {
        let html = inline_markdown("**<script>alert(1)</script>** & `a<b`");
        assert_eq!(
            html,
            "<strong>&lt;script&gt;alert(1)&lt;/script&gt;</strong> &amp; <code>a&lt;b</code>"
        );
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn escaping_happens_once() {
        let html = inline_markdown("AT&T");
        assert_eq!(html, "AT&amp;T");
        assert!(!html.contains("&amp;amp;"));
    }

    #[test]
    fn unsafe_link_schemes_render_as_text() {
        assert_eq!(inline_markdown("[click](javascript:alert(1))"), "click)");
        assert_eq!(
            inline_markdown("[home](/index.html)"),
            r#"<a href="/index.html" target="_blank">home</a>"#
        );
        assert_eq!(
            inline_markdown("[mail](mailto:a@example.com)"),
            r#"<a href="mailto:a@example.com" target="_blank">mail</a>"#
        );
    }

    #[test]
    fn attribute_breakout_is_escaped() {
        let html = inline_markdown(r#"[x](https://e.com/" onmouseover="evil)"#);
        assert!(html.contains("&quot;"));
        assert!(!html.contains(r#"" onmouseover=""#));
    }
}
