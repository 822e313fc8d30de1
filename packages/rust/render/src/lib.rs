//! Output rendering: the digest feed, the per-article feed and the HTML page.
//!
//! All documents are pure functions of the digest Markdown, the articles and
//! the `[feed]` config section; [`write_outputs`] puts them on disk.

mod chart;
mod feeds;
mod page;
mod palette;
mod write;

use chrono::{DateTime, NaiveDate, Utc};
use newsdigest_shared::{Article, FeedMetaConfig, Result};

pub use chart::{TOP_TAGS, top_tags, topic_chart_html};
pub use feeds::{articles_feed, digest_feed};
pub use page::render_page;
pub use palette::{BAR_COLORS, NEUTRAL, label_colors, tone_colors};
pub use write::{
    ARTICLES_FEED_FILE, DIGEST_FEED_FILE, PAGE_FILE, RenderedOutputs, write_outputs,
};

/// Render all three documents for `date`.
pub fn render_all(
    meta: &FeedMetaConfig,
    digest_md: &str,
    articles: &[Article],
    date: NaiveDate,
    now: DateTime<Utc>,
) -> Result<RenderedOutputs> {
    let date = date.format("%Y-%m-%d").to_string();
    Ok(RenderedOutputs {
        digest_feed: digest_feed(meta, digest_md, &date, now)?,
        articles_feed: articles_feed(meta, articles, now)?,
        page: render_page(meta, digest_md, articles, &date),
    })
}
