//! HTML → line-oriented Markdown for feed entries and fetched pages.
//!
//! Block elements are visited in document order and each becomes one
//! Markdown token. Only the outermost block of a nested group is emitted, so
//! text is never duplicated; images are emitted exactly once, either
//! standalone or ahead of the block that contains them.

use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

/// Below this many characters the structured extraction is assumed to have
/// missed the content and the flat text fallback is used instead.
pub const MIN_STRUCTURED_LEN: usize = 100;

const BLOCK_TAGS: [&str; 8] = ["p", "h1", "h2", "h3", "h4", "li", "blockquote", "pre"];

/// Subtrees whose text is never content.
const SKIPPED_TAGS: [&str; 5] = ["script", "style", "noscript", "template", "head"];

/// Convert an HTML document or fragment to Markdown-like plain text.
///
/// Relative image sources are resolved against `base_url` when given.
pub fn html_to_markdown(html: &str, base_url: Option<&Url>) -> String {
    let doc = Html::parse_document(html);

    let blocks = structured_blocks(&doc, base_url);
    let structured = blocks.join("\n\n");
    if structured.chars().count() >= MIN_STRUCTURED_LEN {
        return structured;
    }

    let flat = flat_text(&doc);
    debug!(
        structured_len = structured.len(),
        flat_len = flat.len(),
        "structured extraction too short, using flat text"
    );
    flat
}

fn structured_blocks(doc: &Html, base_url: Option<&Url>) -> Vec<String> {
    let Ok(block_sel) = Selector::parse("p, h1, h2, h3, h4, li, blockquote, pre, img") else {
        return Vec::new();
    };
    let Ok(img_sel) = Selector::parse("img") else {
        return Vec::new();
    };

    let mut blocks = Vec::new();

    for el in doc.select(&block_sel) {
        if is_skipped_subtree(&el) || has_block_ancestor(&el) {
            continue;
        }

        let name = el.value().name();
        if name == "img" {
            if let Some(image) = image_reference(&el, base_url) {
                blocks.push(image);
            }
            continue;
        }

        for img in el.select(&img_sel) {
            if let Some(image) = image_reference(&img, base_url) {
                blocks.push(image);
            }
        }

        if name == "pre" {
            let mut raw = String::new();
            collect_text(el, &mut raw);
            let code = raw.trim_matches('\n').trim_end();
            if !code.trim().is_empty() {
                blocks.push(format!("```\n{code}\n```"));
            }
            continue;
        }

        let text = block_text(el);
        if text.is_empty() {
            continue;
        }

        let token = match name {
            "h1" | "h2" | "h3" | "h4" => {
                let level = name[1..].parse::<usize>().unwrap_or(1);
                format!("{} {text}", "#".repeat(level))
            }
            "li" => format!("- {text}"),
            "blockquote" => format!("> {text}"),
            _ => text,
        };
        blocks.push(token);
    }

    blocks
}

/// `![alt](src)` for an image with a non-empty source.
fn image_reference(img: &ElementRef<'_>, base_url: Option<&Url>) -> Option<String> {
    let src = img.value().attr("src")?.trim();
    if src.is_empty() {
        return None;
    }
    let alt = img.value().attr("alt").unwrap_or("").trim();
    let resolved = match base_url {
        Some(base) => base
            .join(src)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| src.to_string()),
        None => src.to_string(),
    };
    Some(format!("![{alt}]({resolved})"))
}

fn has_block_ancestor(el: &ElementRef<'_>) -> bool {
    el.ancestors().any(|node| {
        node.value()
            .as_element()
            .is_some_and(|e| BLOCK_TAGS.contains(&e.name()))
    })
}

fn is_skipped_subtree(el: &ElementRef<'_>) -> bool {
    el.ancestors().any(|node| {
        node.value()
            .as_element()
            .is_some_and(|e| SKIPPED_TAGS.contains(&e.name()))
    })
}

/// Visible text of a block with whitespace runs collapsed.
fn block_text(el: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_text(el, &mut raw);
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect_text(el: ElementRef<'_>, out: &mut String) {
    for child in el.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child_el) = ElementRef::wrap(child) {
            let name = child_el.value().name();
            if name == "br" {
                out.push('\n');
            } else if !SKIPPED_TAGS.contains(&name) {
                collect_text(child_el, out);
            }
        }
    }
}

/// Every visible text node of the document, trimmed, one per line.
fn flat_text(doc: &Html) -> String {
    let mut lines = Vec::new();
    collect_lines(doc.root_element(), &mut lines);
    lines.join("\n")
}

fn collect_lines(el: ElementRef<'_>, lines: &mut Vec<String>) {
    for child in el.children() {
        if let Some(text) = child.value().as_text() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                lines.push(trimmed.to_string());
            }
        } else if let Some(child_el) = ElementRef::wrap(child) {
            if !SKIPPED_TAGS.contains(&child_el.value().name()) {
                collect_lines(child_el, lines);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILLER: &str = "This paragraph is long enough that the structured extraction \
                          clears the minimum length threshold without any trouble.";

    #[test]
    fn converts_blocks_in_document_order() {
        let html = format!(
            r#"<div>
                <h2>Section title</h2>
                <p>{FILLER}</p>
                <ul><li>first item</li><li>second <b>bold</b> item</li></ul>
                <blockquote>quoted words</blockquote>
                <pre>fn main() {{
    println!("hi");
}}</pre>
            </div>"#
        );
        let md = html_to_markdown(&html, None);
        let expected = format!(
            "## Section title\n\n{FILLER}\n\n- first item\n\n- second bold item\n\n> quoted words\n\n```\nfn main() {{\n    println!(\"hi\");\n}}\n```"
        );
        assert_eq!(md, expected);
    }

    #[test]
    fn images_are_never_dropped() {
        let html = format!(
            r#"<figure><img src="/standalone.png" alt="chart"></figure>
               <p>Intro <img src="https://cdn.example.com/inline.jpg" alt="inline"> {FILLER}</p>"#
        );
        let base = Url::parse("https://blog.example.com/post/1").unwrap();
        let md = html_to_markdown(&html, Some(&base));

        let lines: Vec<&str> = md.split("\n\n").collect();
        assert_eq!(lines[0], "![chart](https://blog.example.com/standalone.png)");
        assert_eq!(lines[1], "![inline](https://cdn.example.com/inline.jpg)");
        assert!(lines[2].starts_with("Intro This paragraph"));
        assert_eq!(md.matches("inline.jpg").count(), 1);
    }

    #[test]
    fn nested_blocks_are_emitted_once() {
        let html = format!("<blockquote><p>{FILLER}</p></blockquote><li><p>nested</p></li>");
        let md = html_to_markdown(&html, None);
        assert_eq!(md.matches("This paragraph").count(), 1);
        assert!(md.starts_with("> This paragraph"));
        assert!(md.ends_with("- nested"));
    }

    #[test]
    fn script_and_style_are_ignored() {
        let html = format!(
            "<style>p {{ color: red }}</style><p>{FILLER}<script>alert(1)</script></p>"
        );
        let md = html_to_markdown(&html, None);
        assert!(!md.contains("alert"));
        assert!(!md.contains("color"));
    }

    #[test]
    fn short_extraction_falls_back_to_flat_text() {
        let html = "<div>Plain text outside any block<span>and a span</span></div><p>tiny</p>";
        let md = html_to_markdown(html, None);
        assert_eq!(md, "Plain text outside any block\nand a span\ntiny");
    }

    #[test]
    fn plain_text_input_survives() {
        let md = html_to_markdown("Just a plain summary with no markup.", None);
        assert_eq!(md, "Just a plain summary with no markup.");
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert_eq!(html_to_markdown("", None), "");
        assert_eq!(html_to_markdown("<p>   </p>", None), "");
    }
}
