//! Per-article enrichment with dedup and fault isolation.
//!
//! Each article is checked against the store, enriched through the four
//! capability calls, validated and saved. Any failure discards that article
//! alone; the batch always runs to completion.

use newsdigest_shared::{Article, Enrichment, Result};
use newsdigest_storage::Storage;
use tracing::{debug, info, instrument, warn};

use crate::enrichment::EnrichmentCapability;
use crate::pipeline::ProgressReporter;

/// Outcome of [`process_articles`].
#[derive(Debug, Default)]
pub struct ProcessReport {
    /// Newly enriched and persisted articles, in input order.
    pub enriched: Vec<Article>,
    /// Already in the store.
    pub skipped_processed: usize,
    /// Blank content.
    pub skipped_empty: usize,
    /// Capability, validation or storage failures.
    pub failed: usize,
}

impl ProcessReport {
    pub fn skipped(&self) -> usize {
        self.skipped_processed + self.skipped_empty
    }
}

/// Enrich and persist every article not yet in the store.
#[instrument(skip_all, fields(articles = articles.len()))]
pub async fn process_articles(
    articles: Vec<Article>,
    capability: &dyn EnrichmentCapability,
    storage: &Storage,
    progress: &dyn ProgressReporter,
) -> ProcessReport {
    let mut report = ProcessReport::default();
    let total = articles.len();

    for (i, mut article) in articles.into_iter().enumerate() {
        progress.article(i + 1, total, &article.title);

        match storage.is_processed(&article.url).await {
            Ok(true) => {
                debug!(url = %article.url, "already processed, skipping");
                report.skipped_processed += 1;
                continue;
            }
            Ok(false) => {}
            Err(e) => {
                warn!(url = %article.url, error = %e, "dedup check failed, skipping article");
                report.failed += 1;
                continue;
            }
        }

        if article.content.trim().is_empty() {
            info!(url = %article.url, "empty content, skipping");
            report.skipped_empty += 1;
            continue;
        }

        let enrichment = match enrich(&article, capability).await {
            Ok(enrichment) => enrichment,
            Err(e) => {
                warn!(url = %article.url, error = %e, "enrichment failed, discarding article");
                report.failed += 1;
                continue;
            }
        };

        article.enrichment = Some(enrichment);
        if let Err(e) = storage.save(&article).await {
            warn!(url = %article.url, error = %e, "failed to persist article");
            report.failed += 1;
            continue;
        }

        info!(url = %article.url, title = %article.display_title(), "article enriched");
        report.enriched.push(article);
    }

    info!(
        enriched = report.enriched.len(),
        total,
        skipped = report.skipped(),
        failed = report.failed,
        "enrichment finished"
    );
    report
}

/// Run the four capability calls and assemble a complete [`Enrichment`].
async fn enrich(article: &Article, capability: &dyn EnrichmentCapability) -> Result<Enrichment> {
    let text = article.content.as_str();
    let title = article.title.as_str();

    let summary = capability.summarize(text, title).await?;
    let tags = capability.extract_tags(text, title).await?;
    let translation = capability.translate(text, title).await?;
    let extras = capability.extract_quotes_and_tone(text, title).await?;

    let enrichment = Enrichment {
        summary,
        tags,
        translation,
        quotes: extras.quotes,
        tone: extras.tone,
        translated_title: extras.translated_title,
    };
    enrichment.validate()?;
    Ok(enrichment)
}
