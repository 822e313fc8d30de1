//! The browsable HTML page: digest tab with topic chart, article cards tab.

use newsdigest_markdown::{escape_html, markdown_to_html};
use newsdigest_shared::{Article, FeedMetaConfig, QuotePair};

use crate::chart::topic_chart_html;
use crate::palette::tone_colors;

const STYLE: &str = include_str!("../assets/page.css");
const SCRIPT: &str = include_str!("../assets/page.js");

/// Render the complete page for one digest date.
pub fn render_page(meta: &FeedMetaConfig, digest_md: &str, articles: &[Article], date: &str) -> String {
    let title = escape_html(&meta.title);
    let description = escape_html(&meta.description);
    let lang = escape_html(&meta.language);
    let date = escape_html(date);
    let chart = topic_chart_html(articles);
    let digest_html = markdown_to_html(digest_md);
    let cards = articles
        .iter()
        .map(article_card)
        .collect::<Vec<_>>()
        .join("\n\n");
    let count = articles.len();

    format!(
        r#"<!DOCTYPE html>
<html lang="{lang}">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title}</title>
<style>
{STYLE}</style>
</head>
<body>

<div class="header">
  <h1>{title}</h1>
  <p>{description}</p>
</div>

<div class="container">
  <div class="tabs">
    <button class="tab active" onclick="switchTab('digest', this)">每日日报</button>
    <button class="tab" onclick="switchTab('articles', this)">全部文章 ({count})</button>
  </div>

  <div id="tab-digest" class="tab-content active">
    {chart}
    <div class="digest-card">
      <h2>{date} 日报</h2>
      {digest_html}
    </div>
  </div>

  <div id="tab-articles" class="tab-content">
    {cards}
  </div>
</div>

<div class="footer">{title} &middot; {date}</div>

<script>
{SCRIPT}</script>
</body>
</html>
"#
    )
}

fn article_card(article: &Article) -> String {
    let source = escape_html(&article.source_name);
    let title = escape_html(article.display_title());
    let url = escape_html(&article.url);

    let Some(enrichment) = &article.enrichment else {
        return format!(
            r#"<div class="article-card">
      <div class="source">{source}</div>
      <div class="title-row"><div class="title">{title}</div></div>
      <a class="link" href="{url}" target="_blank">阅读原文 &rarr;</a>
    </div>"#
        );
    };

    let (bg, fg) = tone_colors(&enrichment.tone);
    let tone = format!(
        r#"<span class="tone-pill" style="background:{bg};color:{fg}">{}</span>"#,
        escape_html(enrichment.tone.label())
    );
    let original_title = if enrichment.translated_title.trim().is_empty() || article.title.is_empty() {
        String::new()
    } else {
        format!(r#"<div class="title-en">{}</div>"#, escape_html(&article.title))
    };
    let tags: String = enrichment
        .tags
        .iter()
        .map(|t| format!(r#"<span class="tag">{}</span>"#, escape_html(t)))
        .collect();
    let summary = escape_html(&enrichment.summary);
    let quotes = quotes_html(&enrichment.quotes);
    // Translation is model-produced HTML and passed through as-is
    let translation = &enrichment.translation;

    format!(
        r#"<div class="article-card">
      <div class="source">{source}</div>
      <div class="title-row">
        <div class="title">{title}</div>
        {tone}
      </div>
      {original_title}
      <div class="tags">{tags}</div>
      <div class="summary">{summary}</div>
      {quotes}
      <div class="translation">{translation}</div>
      <button class="toggle-btn" onclick="toggleTranslation(this)">展开全文翻译</button>
      <a class="link" href="{url}" target="_blank">阅读原文 &rarr;</a>
    </div>"#
    )
}

fn quotes_html(quotes: &[QuotePair]) -> String {
    let blocks: Vec<String> = quotes
        .iter()
        .filter(|q| !q.source.trim().is_empty())
        .map(|q| {
            format!(
                r#"<div class="quote-block"><div class="quote-source">{}</div><div class="quote-target">{}</div></div>"#,
                escape_html(&q.source),
                escape_html(&q.target)
            )
        })
        .collect();

    if blocks.is_empty() {
        return String::new();
    }
    format!("<div class=\"quotes-section\">\n{}\n</div>", blocks.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use newsdigest_shared::{Enrichment, Tone};

    fn meta() -> FeedMetaConfig {
        FeedMetaConfig::default()
    }

    fn article(enriched: bool) -> Article {
        Article {
            url: "https://example.com/p?a=1&b=2".into(),
            title: "Original <Title>".into(),
            author: "Ann".into(),
            source_name: "Example".into(),
            published_at: None,
            content: "body".into(),
            enrichment: enriched.then(|| Enrichment {
                summary: "摘要 & 更多".into(),
                tags: vec!["LLM".into()],
                translation: "<p>译文</p>".into(),
                quotes: vec![
                    QuotePair {
                        source: "It \"works\"".into(),
                        target: "它可以".into(),
                    },
                    QuotePair {
                        source: " ".into(),
                        target: "空".into(),
                    },
                ],
                tone: Tone::Critical,
                translated_title: "中文标题".into(),
            }),
        }
    }

    #[test]
    fn page_contains_tabs_chart_and_cards() {
        let page = render_page(&meta(), "## 重点\n- 一条", &[article(true)], "2026-03-01");
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("全部文章 (1)"));
        assert!(page.contains("今日主题分布"));
        assert!(page.contains("<h3>重点</h3>"));
        assert!(page.contains("2026-03-01 日报"));
        assert!(page.contains("function toggleTranslation"));
    }

    #[test]
    fn card_escapes_fields_and_passes_translation_through() {
        let card = article_card(&article(true));
        assert!(card.contains(r#"<div class="title">中文标题</div>"#));
        assert!(card.contains("Original &lt;Title&gt;"));
        assert!(card.contains("摘要 &amp; 更多"));
        assert!(card.contains("It &quot;works&quot;"));
        assert!(card.contains(r#"<div class="translation"><p>译文</p></div>"#));
        assert!(card.contains("background:#ffe4e6;color:#be123c"));
        assert!(card.contains("href=\"https://example.com/p?a=1&amp;b=2\""));
        assert_eq!(card.matches("quote-block").count(), 1);
        assert!(card.contains("展开全文翻译"));
    }

    #[test]
    fn unknown_tone_rendered_with_neutral_pill() {
        let mut a = article(true);
        if let Some(e) = a.enrichment.as_mut() {
            e.tone = Tone::Other("🔥 激烈".into());
        }
        let card = article_card(&a);
        assert!(card.contains(
            r#"<span class="tone-pill" style="background:#f0f0f5;color:#515154">🔥 激烈</span>"#
        ));
    }

    #[test]
    fn unenriched_card_is_minimal() {
        let card = article_card(&article(false));
        assert!(card.contains("Original &lt;Title&gt;"));
        assert!(!card.contains("toggle-btn"));
        assert!(!card.contains("tone-pill"));
    }

    #[test]
    fn missing_translated_title_falls_back() {
        let mut a = article(true);
        if let Some(e) = a.enrichment.as_mut() {
            e.translated_title.clear();
        }
        let card = article_card(&a);
        assert!(card.contains(r#"<div class="title">Original &lt;Title&gt;</div>"#));
        assert!(!card.contains("title-en"));
    }
}
