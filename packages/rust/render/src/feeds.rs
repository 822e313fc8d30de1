//! RSS 2.0 documents: the daily digest feed and the per-article feed.

use chrono::{DateTime, Utc};
use newsdigest_markdown::{escape_html, markdown_to_html};
use newsdigest_shared::{Article, FeedMetaConfig, NewsDigestError, Result};
use rss::{Channel, Guid, Item};

/// Single-item feed carrying the day's digest.
pub fn digest_feed(
    meta: &FeedMetaConfig,
    digest_md: &str,
    date: &str,
    now: DateTime<Utc>,
) -> Result<String> {
    let link = meta.link.trim_end_matches('/');
    let item = Item {
        title: Some(format!("📰 {} - {date}", meta.title)),
        link: Some(link.to_string()),
        guid: Some(Guid {
            value: format!("{link}/daily-digest/{date}"),
            permalink: false,
        }),
        pub_date: Some(now.to_rfc2822()),
        description: Some(markdown_to_html(digest_md)),
        ..Default::default()
    };

    write_channel(base_channel(
        meta,
        meta.title.clone(),
        meta.description.clone(),
        vec![item],
        now,
    ))
}

/// One item per article with tags, summary, translation and source link.
pub fn articles_feed(meta: &FeedMetaConfig, articles: &[Article], now: DateTime<Utc>) -> Result<String> {
    let items = articles
        .iter()
        .map(|article| Item {
            title: Some(format!(
                "[翻译] {}: {}",
                article.source_name,
                article.display_title()
            )),
            link: Some(article.url.clone()),
            guid: Some(Guid {
                value: article.url.clone(),
                permalink: true,
            }),
            author: Some(if article.author.trim().is_empty() {
                article.source_name.clone()
            } else {
                article.author.clone()
            }),
            pub_date: Some(article.published_at.unwrap_or(now).to_rfc2822()),
            description: Some(article_item_html(article)),
            ..Default::default()
        })
        .collect();

    write_channel(base_channel(
        meta,
        format!("{} - 文章全文", meta.title),
        "每篇文章的中文摘要和全文翻译".to_string(),
        items,
        now,
    ))
}

/// Item body: tags, summary, original title, then the translation between rules.
fn article_item_html(article: &Article) -> String {
    let mut parts = Vec::new();

    if let Some(e) = &article.enrichment {
        if !e.tags.is_empty() {
            let tags = e
                .tags
                .iter()
                .map(|t| format!("#{t}"))
                .collect::<Vec<_>>()
                .join(" ");
            parts.push(format!("<p><strong>标签:</strong> {}</p>", escape_html(&tags)));
        }
        if !e.summary.trim().is_empty() {
            parts.push(format!(
                "<p><strong>摘要:</strong> {}</p>",
                escape_html(&e.summary)
            ));
        }
        if !e.translated_title.trim().is_empty() && !article.title.is_empty() {
            parts.push(format!(
                r#"<p style="color:#888;font-size:13px;">原标题: {}</p>"#,
                escape_html(&article.title)
            ));
        }
    }

    parts.push("<hr/>".to_string());
    if let Some(e) = &article.enrichment {
        parts.push(e.translation.clone());
    }
    parts.push("<hr/>".to_string());
    parts.push(format!(
        r#"<p>🔗 <a href="{}">阅读原文</a></p>"#,
        escape_html(&article.url)
    ));

    parts.join("\n")
}

fn base_channel(
    meta: &FeedMetaConfig,
    title: String,
    description: String,
    items: Vec<Item>,
    now: DateTime<Utc>,
) -> Channel {
    Channel {
        title,
        link: meta.link.clone(),
        description,
        language: Some(meta.language.clone()),
        last_build_date: Some(now.to_rfc2822()),
        generator: Some(concat!("newsdigest ", env!("CARGO_PKG_VERSION")).to_string()),
        items,
        ..Default::default()
    }
}

fn write_channel(channel: Channel) -> Result<String> {
    let buf = channel
        .pretty_write_to(Vec::new(), b' ', 2)
        .map_err(|e| NewsDigestError::parse(format!("failed to write RSS: {e}")))?;
    String::from_utf8(buf).map_err(|e| NewsDigestError::parse(format!("RSS is not UTF-8: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use newsdigest_shared::{Enrichment, Tone};

    fn article(url: &str, enriched: bool) -> Article {
        Article {
            url: url.into(),
            title: "Why Rust".into(),
            author: String::new(),
            source_name: "Example Blog".into(),
            published_at: Some(Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()),
            content: "body".into(),
            enrichment: enriched.then(|| Enrichment {
                summary: "关于 Rust 的摘要".into(),
                tags: vec!["编程".into(), "开源".into()],
                translation: "<p>翻译 <mark>内容</mark></p>".into(),
                quotes: vec![],
                tone: Tone::Analytical,
                translated_title: "为什么是 Rust".into(),
            }),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn digest_feed_has_single_dated_item() {
        let meta = FeedMetaConfig::default();
        let xml = digest_feed(&meta, "## 标题\n- **A**: b", "2026-03-01", now()).unwrap();

        let feed = feed_rs::parser::parse(xml.as_bytes()).unwrap();
        assert_eq!(feed.entries.len(), 1);
        let entry = &feed.entries[0];
        assert_eq!(
            entry.title.as_ref().unwrap().content,
            "📰 AI/产品/技术日报 - 2026-03-01"
        );
        assert_eq!(entry.id, "http://localhost:8080/daily-digest/2026-03-01");
        let body = &entry.summary.as_ref().unwrap().content;
        assert!(body.contains("<h3>标题</h3>"));
        assert!(body.contains("<strong>A</strong>"));
    }

    #[test]
    fn articles_feed_item_per_article() {
        let meta = FeedMetaConfig::default();
        let articles = vec![
            article("https://example.com/a", true),
            article("https://example.com/b", true),
        ];
        let xml = articles_feed(&meta, &articles, now()).unwrap();

        let feed = feed_rs::parser::parse(xml.as_bytes()).unwrap();
        assert_eq!(feed.entries.len(), 2);
        assert_eq!(
            feed.entries[0].title.as_ref().unwrap().content,
            "[翻译] Example Blog: 为什么是 Rust"
        );
        assert_eq!(feed.entries[1].id, "https://example.com/b");
        assert!(xml.contains("AI/产品/技术日报 - 文章全文"));
    }

    #[test]
    fn item_body_layout() {
        let html = article_item_html(&article("https://example.com/a?x=1&y=2", true));
        let lines: Vec<&str> = html.lines().collect();
        assert_eq!(lines[0], "<p><strong>标签:</strong> #编程 #开源</p>");
        assert_eq!(lines[1], "<p><strong>摘要:</strong> 关于 Rust 的摘要</p>");
        assert!(lines[2].contains("原标题: Why Rust"));
        assert_eq!(lines[3], "<hr/>");
        assert_eq!(lines[4], "<p>翻译 <mark>内容</mark></p>");
        assert_eq!(lines[5], "<hr/>");
        assert_eq!(
            lines[6],
            r#"<p>🔗 <a href="https://example.com/a?x=1&amp;y=2">阅读原文</a></p>"#
        );
    }

    #[test]
    fn unenriched_item_uses_original_title_and_source_author() {
        let meta = FeedMetaConfig::default();
        let mut a = article("https://example.com/raw", false);
        a.published_at = None;
        let xml = articles_feed(&meta, &[a], now()).unwrap();
        assert!(xml.contains("[翻译] Example Blog: Why Rust"));
        assert!(xml.contains("<author>Example Blog</author>"));
        assert!(xml.contains(&now().to_rfc2822()));
    }
}
