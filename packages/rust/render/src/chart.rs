//! Topic distribution chart: the most frequent tags as CSS bars.

use newsdigest_markdown::escape_html;
use newsdigest_shared::Article;

use crate::palette::bar_color;

/// Number of tags shown in the chart.
pub const TOP_TAGS: usize = 8;

/// Most frequent tags, count descending, ties in first-seen order.
pub fn top_tags(articles: &[Article], limit: usize) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for tag in articles.iter().flat_map(|a| a.tags()) {
        match counts.iter_mut().find(|(t, _)| t == tag) {
            Some((_, n)) => *n += 1,
            None => counts.push((tag.clone(), 1)),
        }
    }
    // Stable sort keeps first-seen order among equal counts
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(limit);
    counts
}

/// Chart markup, or an empty string when no article has tags.
pub fn topic_chart_html(articles: &[Article]) -> String {
    let top = top_tags(articles, TOP_TAGS);
    let Some(max) = top.first().map(|(_, n)| *n) else {
        return String::new();
    };

    let rows: Vec<String> = top
        .iter()
        .enumerate()
        .map(|(rank, (tag, count))| {
            let pct = count * 100 / max;
            format!(
                r#"<div class="chart-row"><span class="chart-label">{}</span><div class="chart-bar-bg"><div class="chart-bar" style="width:{pct}%;background:{}"></div></div><span class="chart-count">{count}</span></div>"#,
                escape_html(tag),
                bar_color(rank),
            )
        })
        .collect();

    format!(
        "<div class=\"topic-chart\">\n<h2>今日主题分布</h2>\n{}\n</div>",
        rows.join("\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use newsdigest_shared::{Enrichment, Tone};

    fn tagged(tags: &[&str]) -> Article {
        Article {
            url: "https://example.com".into(),
            title: "t".into(),
            author: "a".into(),
            source_name: "s".into(),
            published_at: None,
            content: "c".into(),
            enrichment: Some(Enrichment {
                summary: "s".into(),
                tags: tags.iter().map(|t| t.to_string()).collect(),
                translation: "t".into(),
                quotes: vec![],
                tone: Tone::default(),
                translated_title: String::new(),
            }),
        }
    }

    #[test]
    fn counts_and_orders_tags() {
        let articles = vec![
            tagged(&["Rust", "LLM"]),
            tagged(&["LLM", "产品"]),
            tagged(&["LLM", "Rust"]),
            tagged(&["开源"]),
        ];
        let top = top_tags(&articles, TOP_TAGS);
        assert_eq!(
            top,
            vec![
                ("LLM".to_string(), 3),
                ("Rust".to_string(), 2),
                ("产品".to_string(), 1),
                ("开源".to_string(), 1),
            ]
        );
    }

    #[test]
    fn limits_to_top_n() {
        let articles: Vec<Article> = (0..12).map(|i| tagged(&[&format!("t{i}")])).collect();
        assert_eq!(top_tags(&articles, TOP_TAGS).len(), 8);
    }

    #[test]
    fn percentages_relative_to_top() {
        let articles = vec![tagged(&["a", "b"]), tagged(&["a"]), tagged(&["a"])];
        let html = topic_chart_html(&articles);
        assert!(html.contains("width:100%;background:#0071e3"));
        assert!(html.contains("width:33%;background:#34c759"));
        assert!(html.contains("今日主题分布"));
    }

    #[test]
    fn no_tags_no_chart() {
        assert_eq!(topic_chart_html(&[]), "");
    }
}
