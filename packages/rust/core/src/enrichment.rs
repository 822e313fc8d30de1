//! The AI capability seam and the defensive parsers for its responses.
//!
//! [`EnrichmentCapability`] is the only interface the orchestrator sees.
//! Backends are chosen at startup and used as a trait object.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use newsdigest_shared::{QuotePair, Result, Tone};
use serde::Serialize;
use tracing::warn;

// ---------------------------------------------------------------------------
// Capability types
// ---------------------------------------------------------------------------

/// Result of the combined quotes / tone / title call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuotesAndTone {
    pub quotes: Vec<QuotePair>,
    pub tone: Tone,
    /// Empty when the model returned none.
    pub translated_title: String,
}

/// One article as presented to the daily report call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DigestItem {
    pub title: String,
    pub author: String,
    pub source_name: String,
    pub tags: Vec<String>,
    pub summary: String,
    /// Umbrella categories from topic clustering.
    pub categories: Vec<String>,
}

/// Token usage for one operation kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OperationUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub calls: u64,
}

/// Accumulated token usage of a capability.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UsageReport {
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub total_calls: u64,
    pub by_operation: BTreeMap<String, OperationUsage>,
}

/// Pluggable AI-text operations used to enrich articles.
#[async_trait]
pub trait EnrichmentCapability: Send + Sync {
    /// Short summary in the target language.
    async fn summarize(&self, text: &str, title: &str) -> Result<String>;

    /// Topic tags, most relevant first.
    async fn extract_tags(&self, text: &str, title: &str) -> Result<Vec<String>>;

    /// Full translation as structured HTML.
    async fn translate(&self, text: &str, title: &str) -> Result<String>;

    /// Notable quotes, overall tone and a translated title in one call.
    async fn extract_quotes_and_tone(&self, text: &str, title: &str) -> Result<QuotesAndTone>;

    /// Markdown daily report over the enriched articles.
    async fn generate_daily_report(&self, items: &[DigestItem]) -> Result<String>;

    /// Token usage so far. Capabilities that do not meter report nothing.
    fn usage(&self) -> UsageReport {
        UsageReport::default()
    }
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

/// Truncate content to at most `max_chars` characters, marking the cut.
pub fn truncate_content(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        None => content.to_string(),
        Some((idx, _)) => {
            format!("{}\n\n[... content truncated ...]", &content[..idx])
        }
    }
}

/// Remove a surrounding Markdown code fence, if any.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }
    let body = trimmed.split_once('\n').map_or("", |(_, rest)| rest);
    body.rsplit_once("```").map_or(body, |(inner, _)| inner).trim()
}

/// Parse a tag list: a JSON array, or failing that a comma-separated list.
/// Repeated tags are dropped, keeping first-seen order.
pub fn parse_tags(raw: &str) -> Vec<String> {
    let cleaned = strip_code_fence(raw);

    let tags: Vec<String> = match serde_json::from_str::<Vec<serde_json::Value>>(cleaned) {
        Ok(values) => values
            .into_iter()
            .map(|v| match v {
                serde_json::Value::String(s) => s.trim().to_string(),
                other => other.to_string(),
            })
            .filter(|t| !t.is_empty())
            .collect(),
        Err(e) => {
            warn!(error = %e, raw = %cleaned, "tag response is not a JSON array, splitting on commas");
            cleaned
                .split([',', '，'])
                .map(|t| t.trim().trim_matches(['"', '#', '[', ']', ' ']).to_string())
                .filter(|t| !t.is_empty())
                .collect()
        }
    };

    let mut seen = HashSet::new();
    tags.into_iter().filter(|t| seen.insert(t.clone())).collect()
}

/// Parse the quotes/tone/title object. Malformed input yields defaults.
///
/// Expected shape: `{"title_zh": "..", "quotes": [{"en": "..", "zh": ".."}], "tone": ".."}`.
/// Quotes missing either side are dropped. Unknown tone labels are kept as
/// [`Tone::Other`]; a missing tone is the default.
pub fn parse_quotes_and_tone(raw: &str) -> QuotesAndTone {
    let cleaned = strip_code_fence(raw);
    let value: serde_json::Value = match serde_json::from_str(cleaned) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, raw = %cleaned, "quotes/tone response is not JSON, using defaults");
            return QuotesAndTone::default();
        }
    };

    let quotes = value
        .get("quotes")
        .and_then(|q| q.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|q| {
                    let source = q.get("en")?.as_str()?;
                    let target = q.get("zh")?.as_str()?;
                    Some(QuotePair {
                        source: source.to_string(),
                        target: target.to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    let tone = value
        .get("tone")
        .and_then(|t| t.as_str())
        .map(Tone::from_label)
        .unwrap_or_default();

    let translated_title = value
        .get("title_zh")
        .and_then(|t| t.as_str())
        .map(|t| t.trim().to_string())
        .unwrap_or_default();

    QuotesAndTone {
        quotes,
        tone,
        translated_title,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
