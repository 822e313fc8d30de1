//! Daily digest composition.

use newsdigest_shared::Article;
use tracing::{info, instrument, warn};

use crate::cluster::{categories_for, cluster_by_topic};
use crate::enrichment::{DigestItem, EnrichmentCapability};

/// Digest used when a run produced no articles.
pub const EMPTY_DIGEST: &str = "今日暂无新文章。";

/// Project articles into the items handed to the report call.
pub fn digest_items(articles: &[Article]) -> Vec<DigestItem> {
    articles
        .iter()
        .map(|a| DigestItem {
            title: a.title.clone(),
            author: a.author.clone(),
            source_name: a.source_name.clone(),
            tags: a.tags().to_vec(),
            summary: a
                .enrichment
                .as_ref()
                .map(|e| e.summary.clone())
                .unwrap_or_default(),
            categories: categories_for(a).into_iter().map(String::from).collect(),
        })
        .collect()
}

/// Ask the capability for the daily report, falling back to [`local_digest`].
#[instrument(skip_all, fields(articles = articles.len()))]
pub async fn generate_daily_digest(
    articles: &[Article],
    capability: &dyn EnrichmentCapability,
) -> String {
    if articles.is_empty() {
        return EMPTY_DIGEST.to_string();
    }

    match capability.generate_daily_report(&digest_items(articles)).await {
        Ok(report) if !report.trim().is_empty() => {
            info!(chars = report.chars().count(), "daily report generated");
            report
        }
        Ok(_) => {
            warn!("daily report was empty, composing digest locally");
            local_digest(articles)
        }
        Err(e) => {
            warn!(error = %e, "daily report failed, composing digest locally");
            local_digest(articles)
        }
    }
}

/// Clustered Markdown digest built without any model call.
pub fn local_digest(articles: &[Article]) -> String {
    if articles.is_empty() {
        return EMPTY_DIGEST.to_string();
    }

    let mut sections = Vec::new();
    for (category, members) in cluster_by_topic(articles) {
        let mut section = format!("## {category}\n");
        for article in members {
            let byline = if article.author.is_empty() || article.author == article.source_name {
                article.source_name.clone()
            } else {
                format!("{} / {}", article.author, article.source_name)
            };
            section.push_str(&format!("\n- **{}** ({byline})", article.display_title()));
            if let Some(summary) = article
                .enrichment
                .as_ref()
                .map(|e| e.summary.trim())
                .filter(|s| !s.is_empty())
            {
                section.push_str(&format!(": {summary}"));
            }
        }
        sections.push(section);
    }
    sections.join("\n\n")
}

/// Plain article list used for dry runs.
pub fn dry_run_digest(articles: &[Article]) -> String {
    let mut lines = vec!["## 今日文章\n".to_string()];
    lines.extend(
        articles
            .iter()
            .map(|a| format!("- **{}**: {}", a.source_name, a.title)),
    );
    lines.join("\n")
}
