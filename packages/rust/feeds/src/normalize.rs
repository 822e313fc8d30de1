//! Feed entries → canonical [`Article`] records.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use feed_rs::model::Entry;
use newsdigest_markdown::{extract_main_content, html_to_markdown};
use newsdigest_shared::{Article, DefaultsConfig, FeedSource, NewsDigestError, Result, UNTITLED};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::fetch::HttpFetcher;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Knobs controlling which entries survive normalization.
#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    /// Entries published before `now - window` are dropped.
    pub window: TimeDelta,
    /// Content shorter than this (in chars) triggers a full-text fetch.
    pub min_content_length: usize,
    /// Keep entries that carry neither a published nor an updated date.
    pub keep_undated: bool,
    /// Pause between consecutive sources.
    pub source_pause: Duration,
}

impl NormalizeOptions {
    pub fn from_defaults(defaults: &DefaultsConfig) -> Self {
        Self {
            window: TimeDelta::hours(i64::from(defaults.window_hours)),
            min_content_length: defaults.min_content_length,
            keep_undated: defaults.keep_undated,
            source_pause: Duration::from_millis(defaults.source_pause_ms),
        }
    }

    /// Replace the window with `days` whole days.
    pub fn with_days(mut self, days: u32) -> Self {
        self.window = TimeDelta::days(i64::from(days));
        self
    }
}

/// Whether an entry timestamp falls inside the window ending at `now`.
pub fn in_window(
    published: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    window: TimeDelta,
    keep_undated: bool,
) -> bool {
    match published {
        Some(ts) => ts >= now - window,
        None => keep_undated,
    }
}

// ---------------------------------------------------------------------------
// FeedNormalizer
// ---------------------------------------------------------------------------

/// Articles gathered from a set of sources, plus the sources that failed.
#[derive(Debug, Default)]
pub struct FeedBatch {
    pub articles: Vec<Article>,
    pub failed_sources: Vec<String>,
}

/// Fetches feeds one source at a time and normalizes their entries.
pub struct FeedNormalizer {
    fetcher: HttpFetcher,
    options: NormalizeOptions,
}

impl FeedNormalizer {
    pub fn new(fetcher: HttpFetcher, options: NormalizeOptions) -> Self {
        Self { fetcher, options }
    }

    /// Build a normalizer from the `[defaults]` config section.
    pub fn from_config(defaults: &DefaultsConfig) -> Result<Self> {
        let fetcher = HttpFetcher::new(
            &defaults.user_agent,
            Duration::from_secs(defaults.http_timeout_secs),
        )?;
        Ok(Self::new(fetcher, NormalizeOptions::from_defaults(defaults)))
    }

    /// Replace the configured window with `days` whole days.
    pub fn with_window_days(mut self, days: u32) -> Self {
        self.options = self.options.with_days(days);
        self
    }

    /// Fetch every source in order and collect in-window articles.
    ///
    /// A source that fails to download or parse is logged and skipped.
    #[instrument(skip_all, fields(sources = sources.len()))]
    pub async fn fetch_articles(&self, sources: &[FeedSource], now: DateTime<Utc>) -> FeedBatch {
        let mut batch = FeedBatch::default();

        for (i, source) in sources.iter().enumerate() {
            if i > 0 && !self.options.source_pause.is_zero() {
                tokio::time::sleep(self.options.source_pause).await;
            }

            match self.fetch_source(source, now).await {
                Ok(articles) => {
                    info!(source = %source.name, count = articles.len(), "fetched source");
                    batch.articles.extend(articles);
                }
                Err(e) => {
                    warn!(source = %source.name, error = %e, "skipping source");
                    batch.failed_sources.push(source.name.clone());
                }
            }
        }

        batch
    }

    async fn fetch_source(&self, source: &FeedSource, now: DateTime<Utc>) -> Result<Vec<Article>> {
        let bytes = self.fetcher.get_bytes(&source.url).await?;
        let feed = feed_rs::parser::parse(bytes.as_slice())
            .map_err(|e| NewsDigestError::parse(format!("{}: {e}", source.url)))?;

        let mut articles = Vec::new();
        for entry in feed.entries {
            if let Some(article) = self.normalize_entry(source, entry, now).await {
                articles.push(article);
            }
        }
        Ok(articles)
    }

    async fn normalize_entry(
        &self,
        source: &FeedSource,
        entry: Entry,
        now: DateTime<Utc>,
    ) -> Option<Article> {
        let published_at = entry.published.or(entry.updated);
        if !in_window(
            published_at,
            now,
            self.options.window,
            self.options.keep_undated,
        ) {
            debug!(source = %source.name, id = %entry.id, "entry outside window");
            return None;
        }

        let Some(url) = entry_link(&entry) else {
            debug!(source = %source.name, id = %entry.id, "entry has no link, skipping");
            return None;
        };

        let base = Url::parse(&url).ok();
        let mut content = entry_body(&entry)
            .map(|html| html_to_markdown(&html, base.as_ref()))
            .unwrap_or_default();

        if content.chars().count() < self.options.min_content_length {
            if let Some(full) = self.fetch_full_text(&url, base.as_ref()).await {
                content = full;
            }
        }

        if content.trim().is_empty() {
            debug!(%url, "entry has no content, skipping");
            return None;
        }

        let title = entry
            .title
            .map(|t| t.content.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| UNTITLED.to_string());
        let author = entry
            .authors
            .first()
            .map(|a| a.name.trim().to_string())
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| source.name.clone());

        Some(Article {
            url,
            title,
            author,
            source_name: source.name.clone(),
            published_at,
            content,
            enrichment: None,
        })
    }

    /// Fetch the entry page and convert its main content. `None` keeps the feed body.
    async fn fetch_full_text(&self, url: &str, base: Option<&Url>) -> Option<String> {
        match self.fetcher.get_text(url).await {
            Ok(html) => {
                let markdown = html_to_markdown(&extract_main_content(&html), base);
                if markdown.trim().is_empty() {
                    debug!(url, "full-text extraction was empty");
                    None
                } else {
                    debug!(url, chars = markdown.chars().count(), "using full text");
                    Some(markdown)
                }
            }
            Err(e) => {
                warn!(url, error = %e, "full-text fetch failed, keeping feed content");
                None
            }
        }
    }
}

/// The entry's permalink: the first `alternate` (or untyped) link, else the first link.
fn entry_link(entry: &Entry) -> Option<String> {
    let usable = |href: &str| !href.trim().is_empty();
    entry
        .links
        .iter()
        .filter(|l| usable(&l.href))
        .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
        .or_else(|| entry.links.iter().find(|l| usable(&l.href)))
        .map(|l| l.href.trim().to_string())
}

/// Content body, then summary, then the first media description.
fn entry_body(entry: &Entry) -> Option<String> {
    let content = entry.content.as_ref().and_then(|c| c.body.clone());
    let summary = entry.summary.as_ref().map(|s| s.content.clone());
    let media = entry
        .media
        .first()
        .and_then(|m| m.description.as_ref())
        .map(|d| d.content.clone());

    [content, summary, media]
        .into_iter()
        .flatten()
        .find(|body| !body.trim().is_empty())
}
