//! End-to-end run: sources → normalize → dedup + enrich → digest → render.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{NaiveDate, Utc};
use newsdigest_feeds::FeedNormalizer;
use newsdigest_render::{
    RenderedOutputs, articles_feed, digest_feed, render_all, render_page, write_outputs,
};
use newsdigest_shared::{AppConfig, Article, FeedSource, NewsDigestError, Result};
use newsdigest_storage::Storage;
use tracing::{debug, info, instrument, warn};

use crate::digest::{dry_run_digest, generate_daily_digest, local_digest};
use crate::enrichment::{EnrichmentCapability, UsageReport};
use crate::processor::process_articles;

/// Options for a single [`run_digest`] call.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Feeds to poll, in order.
    pub sources: Vec<FeedSource>,
    /// Normalize only: no capability calls, no persistence.
    pub dry_run: bool,
    /// Override the ingestion window with whole days.
    pub days: Option<u32>,
}

/// What a run did.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub sources: usize,
    pub failed_sources: Vec<String>,
    /// Articles produced by the normalizer.
    pub fetched: usize,
    pub enriched: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Files written. Empty when the run stopped early.
    pub outputs: Vec<PathBuf>,
    pub elapsed: Duration,
    pub usage: UsageReport,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called before each article is enriched.
    fn article(&self, current: usize, total: usize, title: &str);
    /// Called when the run completes.
    fn done(&self, summary: &RunSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn article(&self, _current: usize, _total: usize, _title: &str) {}
    fn done(&self, _summary: &RunSummary) {}
}

/// Run the full pipeline once.
///
/// 1. Fetch and normalize every source
/// 2. Skip processed articles, enrich and persist the rest
/// 3. Compose the daily digest
/// 4. Render and write both feeds and the page
///
/// The run stops without writing when nothing is in the window or, outside
/// dry runs, when no article was newly enriched.
#[instrument(skip_all, fields(sources = options.sources.len(), dry_run = options.dry_run))]
pub async fn run_digest(
    config: &AppConfig,
    options: &RunOptions,
    capability: Option<&dyn EnrichmentCapability>,
    progress: &dyn ProgressReporter,
) -> Result<RunSummary> {
    let start = Instant::now();
    let capability = match (options.dry_run, capability) {
        (true, _) => None,
        (false, Some(cap)) => Some(cap),
        (false, None) => {
            return Err(NewsDigestError::config(
                "an enrichment capability is required unless running dry",
            ));
        }
    };

    let mut summary = RunSummary {
        sources: options.sources.len(),
        ..RunSummary::default()
    };
    info!(sources = summary.sources, "starting run");

    // --- Phase 1: Normalize ---
    progress.phase("Fetching feeds");
    let normalizer = build_normalizer(config, options.days)?;
    let now = Utc::now();
    let batch = normalizer.fetch_articles(&options.sources, now).await;
    summary.failed_sources = batch.failed_sources;
    summary.fetched = batch.articles.len();

    if batch.articles.is_empty() {
        info!("no articles in window, nothing to do");
        return Ok(finish(summary, start, capability, progress));
    }

    let date = now.date_naive();
    let date_label = date.format("%Y-%m-%d").to_string();
    let output_dir = Path::new(&config.defaults.output_dir);

    let Some(capability) = capability else {
        // --- Dry run ---
        progress.phase("Rendering outputs");
        let digest = dry_run_digest(&batch.articles);
        let outputs = render_all(&config.feed, &digest, &batch.articles, date, now)?;
        summary.outputs = write_outputs(output_dir, &outputs)?;
        return Ok(finish(summary, start, None, progress));
    };

    // --- Phase 2: Dedup + enrich ---
    progress.phase("Opening article store");
    let storage = Storage::open(Path::new(&config.defaults.db_path)).await?;

    progress.phase("Enriching articles");
    let report = process_articles(batch.articles, capability, &storage, progress).await;
    summary.enriched = report.enriched.len();
    summary.skipped = report.skipped();
    summary.failed = report.failed;

    if report.enriched.is_empty() {
        info!("no newly enriched articles, outputs left unchanged");
        return Ok(finish(summary, start, Some(capability), progress));
    }

    // --- Phase 3: Digest ---
    progress.phase("Writing daily digest");
    let digest = generate_daily_digest(&report.enriched, capability).await;

    // --- Phase 4: Render ---
    progress.phase("Rendering outputs");
    let page_articles = articles_for_page(&storage, date, &report.enriched).await;
    let outputs = RenderedOutputs {
        digest_feed: digest_feed(&config.feed, &digest, &date_label, now)?,
        articles_feed: articles_feed(&config.feed, &report.enriched, now)?,
        page: render_page(&config.feed, &digest, &page_articles, &date_label),
    };
    summary.outputs = write_outputs(output_dir, &outputs)?;

    Ok(finish(summary, start, Some(capability), progress))
}

/// Re-render the page and feeds from the records processed on `date`.
///
/// Opens the store read-only and composes the digest locally.
#[instrument(skip_all, fields(%date))]
pub async fn render_from_store(config: &AppConfig, date: NaiveDate) -> Result<Vec<PathBuf>> {
    let storage = Storage::open_readonly(Path::new(&config.defaults.db_path)).await?;
    let articles: Vec<Article> = storage
        .records_for(date)
        .await?
        .into_iter()
        .map(|record| record.article)
        .collect();

    if articles.is_empty() {
        warn!(%date, "no stored articles for date, rendering empty outputs");
    }

    let digest = local_digest(&articles);
    let outputs = render_all(&config.feed, &digest, &articles, date, Utc::now())?;
    let written = write_outputs(Path::new(&config.defaults.output_dir), &outputs)?;

    info!(articles = articles.len(), files = written.len(), "render complete");
    Ok(written)
}

fn build_normalizer(config: &AppConfig, days: Option<u32>) -> Result<FeedNormalizer> {
    let normalizer = FeedNormalizer::from_config(&config.defaults)?;
    Ok(match days {
        Some(days) => normalizer.with_window_days(days),
        None => normalizer,
    })
}

/// Everything stored today, or just this run's articles if that read fails.
async fn articles_for_page(storage: &Storage, date: NaiveDate, processed: &[Article]) -> Vec<Article> {
    match storage.records_for(date).await {
        Ok(records) if !records.is_empty() => records.into_iter().map(|r| r.article).collect(),
        Ok(_) => processed.to_vec(),
        Err(e) => {
            warn!(error = %e, "could not read today's records, using this run's articles");
            processed.to_vec()
        }
    }
}

fn finish(
    mut summary: RunSummary,
    start: Instant,
    capability: Option<&dyn EnrichmentCapability>,
    progress: &dyn ProgressReporter,
) -> RunSummary {
    summary.elapsed = start.elapsed();
    summary.usage = capability.map(|c| c.usage()).unwrap_or_default();

    for (operation, usage) in &summary.usage.by_operation {
        debug!(
            operation = %operation,
            calls = usage.calls,
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            "token usage"
        );
    }

    info!(
        sources = summary.sources,
        failed_sources = summary.failed_sources.len(),
        fetched = summary.fetched,
        enriched = summary.enriched,
        skipped = summary.skipped,
        failed = summary.failed,
        outputs = summary.outputs.len(),
        model_calls = summary.usage.total_calls,
        input_tokens = summary.usage.total_input_tokens,
        output_tokens = summary.usage.total_output_tokens,
        elapsed_ms = summary.elapsed.as_millis(),
        "run complete"
    );

    progress.done(&summary);
    summary
}
