//! Markup conversion in both directions.
//!
//! - [`html_to_markdown`] normalizes feed HTML and fetched pages into
//!   line-oriented Markdown with image references preserved.
//! - [`extract_main_content`] is the readability heuristic used before a
//!   full-text page is converted.
//! - [`markdown_to_html`] renders model-written Markdown back into safe HTML.

mod from_html;
mod inline;
mod to_html;

use scraper::{Html, Selector};

pub use from_html::{MIN_STRUCTURED_LEN, html_to_markdown};
pub use inline::{escape_html, inline_markdown};
pub use to_html::markdown_to_html;

/// Containers tried in order when locating the main article body.
const CONTENT_SELECTORS: [&str; 6] = [
    "article",
    "main",
    r#"[role="main"]"#,
    ".post-content",
    ".entry-content",
    ".content",
];

/// Chrome removed inside a content container. A `<header>` there holds the
/// post's own title and byline, so it stays.
const CONTAINER_CHROME: &str = "nav, footer, aside, script, style, form, .sidebar, .nav, .comments";

/// Chrome removed when falling back to the whole `<body>`.
const PAGE_CHROME: &str =
    "nav, header, footer, aside, script, style, form, .sidebar, .nav, .comments";

/// Return the inner HTML of the page's main content area with chrome removed.
///
/// Falls back to `<body>` when no known container exists. Returns an empty
/// string when the page has neither.
pub fn extract_main_content(html: &str) -> String {
    let doc = Html::parse_document(html);

    for sel_str in CONTENT_SELECTORS {
        if let Ok(selector) = Selector::parse(sel_str) {
            if let Some(el) = doc.select(&selector).next() {
                return strip_chrome(&el.inner_html(), CONTAINER_CHROME);
            }
        }
    }

    if let Ok(body_sel) = Selector::parse("body") {
        if let Some(body) = doc.select(&body_sel).next() {
            return strip_chrome(&body.inner_html(), PAGE_CHROME);
        }
    }

    String::new()
}

/// Strip elements matching `chrome` from an HTML fragment.
fn strip_chrome(html: &str, chrome: &str) -> String {
    let Ok(chrome_sel) = Selector::parse(chrome) else {
        return html.to_string();
    };

    let doc = Html::parse_fragment(html);
    let mut result = html.to_string();
    for el in doc.select(&chrome_sel) {
        let outer = el.html();
        result = result.replace(&outer, "");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_article_container() {
        let html = r#"<html><body>
            <nav>Home | About</nav>
            <article><h1>Post</h1><p>Body text</p><footer>share</footer></article>
            <aside>Related</aside>
        </body></html>"#;
        let content = extract_main_content(html);
        assert!(content.contains("Body text"));
        assert!(!content.contains("Home | About"));
        assert!(!content.contains("Related"));
        assert!(!content.contains("share"));
    }

    #[test]
    fn article_header_kept_inside_container() {
        let html = r#"<html><body>
            <header>Site header</header>
            <article><header><h1>Title</h1><p>By Alice</p></header><p>Body</p><footer>share</footer></article>
        </body></html>"#;
        let content = extract_main_content(html);
        assert!(content.contains("Title"));
        assert!(content.contains("By Alice"));
        assert!(content.contains("Body"));
        assert!(!content.contains("share"));
        assert!(!content.contains("Site header"));
    }

    #[test]
    fn falls_back_to_body_without_chrome() {
        let html = r#"<html><body>
            <header>Site header</header>
            <div><p>Only paragraph</p></div>
            <footer>Copyright</footer>
        </body></html>"#;
        let content = extract_main_content(html);
        assert!(content.contains("Only paragraph"));
        assert!(!content.contains("Site header"));
        assert!(!content.contains("Copyright"));
    }

    #[test]
    fn extraction_feeds_conversion() {
        let html = r#"<html><body><main>
            <h2>Heading</h2>
            <p>A paragraph that is long enough to count as real structured content for the converter, with room to spare.</p>
            <script>track()</script>
        </main></body></html>"#;
        let md = html_to_markdown(&extract_main_content(html), None);
        assert!(md.starts_with("## Heading\n\nA paragraph"));
        assert!(!md.contains("track"));
    }
}
