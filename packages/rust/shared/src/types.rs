//! Core domain types for the digest pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{NewsDigestError, Result};

/// Title used when a feed entry carries none.
pub const UNTITLED: &str = "无标题";

/// Deterministic identity hash for an article URL (SHA-256, lowercase hex).
pub fn url_hash(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    format!("{:x}", hasher.finalize())
}

// ---------------------------------------------------------------------------
// FeedSource
// ---------------------------------------------------------------------------

/// A syndication source to poll (`[[sources]]` in the config file).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSource {
    /// Display name, also the fallback author.
    pub name: String,
    /// Feed URL (RSS or Atom).
    pub url: String,
    /// Free-form category label.
    pub category: String,
    /// Optional note for humans reading the config.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub note: String,
}

impl FeedSource {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        category: impl Into<String>,
        note: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            category: category.into(),
            note: note.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tone
// ---------------------------------------------------------------------------

/// Overall tone of an article. Labels outside the known vocabulary are kept
/// verbatim as [`Tone::Other`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Tone {
    Reflective,
    Critical,
    Excited,
    Experimental,
    Analytical,
    #[default]
    Insightful,
    Other(String),
}

impl Tone {
    /// Every known tone, in the order presented to the model.
    pub const ALL: [Tone; 6] = [
        Tone::Reflective,
        Tone::Critical,
        Tone::Excited,
        Tone::Experimental,
        Tone::Analytical,
        Tone::Insightful,
    ];

    /// Display label, also the persisted form.
    pub fn label(&self) -> &str {
        match self {
            Self::Reflective => "🤔 思辨",
            Self::Critical => "😤 批评",
            Self::Excited => "🎉 兴奋",
            Self::Experimental => "🧪 实验记录",
            Self::Analytical => "📊 分析",
            Self::Insightful => "💡 洞察",
            Self::Other(label) => label,
        }
    }

    /// English name, accepted when parsing.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Reflective => "reflective",
            Self::Critical => "critical",
            Self::Excited => "excited",
            Self::Experimental => "experimental",
            Self::Analytical => "analytical",
            Self::Insightful => "insightful",
            Self::Other(_) => "other",
        }
    }

    fn emoji(&self) -> &str {
        self.label().split(' ').next().unwrap_or_default()
    }

    fn word(&self) -> &str {
        self.label().split(' ').nth(1).unwrap_or_default()
    }

    /// Parse a known tone from its label, its emoji, its bare word, or its English name.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        Self::ALL.into_iter().find(|tone| {
            value == tone.label()
                || value.eq_ignore_ascii_case(tone.name())
                || value.starts_with(tone.emoji())
                || value == tone.word()
        })
    }

    /// Like [`Tone::parse`], but an unrecognized label becomes [`Tone::Other`].
    /// A blank label is the default tone.
    pub fn from_label(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() {
            return Self::default();
        }
        Self::parse(value).unwrap_or_else(|| Self::Other(value.to_string()))
    }
}

impl std::fmt::Display for Tone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Enrichment
// ---------------------------------------------------------------------------

/// A notable sentence and its translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotePair {
    /// Sentence in the article's language.
    #[serde(rename = "en")]
    pub source: String,
    /// Translated sentence.
    #[serde(rename = "zh")]
    pub target: String,
}

/// AI-derived fields attached to an article once every enrichment step succeeded.
#[derive(Debug, Clone, PartialEq)]
pub struct Enrichment {
    pub summary: String,
    pub tags: Vec<String>,
    /// Bilingual translation, already structured HTML.
    pub translation: String,
    pub quotes: Vec<QuotePair>,
    pub tone: Tone,
    /// May be empty; renderers then fall back to the original title.
    pub translated_title: String,
}

impl Enrichment {
    /// Reject results that would persist an article with empty core fields.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.summary.trim().is_empty() {
            missing.push("summary");
        }
        if self.tags.iter().all(|t| t.trim().is_empty()) {
            missing.push("tags");
        }
        if self.translation.trim().is_empty() {
            missing.push("translation");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(NewsDigestError::validation(format!(
                "incomplete enrichment, empty: {}",
                missing.join(", ")
            )))
        }
    }
}

// ---------------------------------------------------------------------------
// Article
// ---------------------------------------------------------------------------

/// The canonical unit of work, produced by the feed normalizer.
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    /// Stable identity and dedup key.
    pub url: String,
    pub title: String,
    pub author: String,
    pub source_name: String,
    pub published_at: Option<DateTime<Utc>>,
    /// Markdown-like plain text with embedded image references.
    pub content: String,
    /// `None` until every enrichment step has succeeded.
    pub enrichment: Option<Enrichment>,
}

impl Article {
    /// Identity hash used as the storage key.
    pub fn url_hash(&self) -> String {
        url_hash(&self.url)
    }

    /// Translated title when available, otherwise the original title.
    pub fn display_title(&self) -> &str {
        match &self.enrichment {
            Some(e) if !e.translated_title.trim().is_empty() => &e.translated_title,
            _ => &self.title,
        }
    }

    /// Tags of an enriched article, empty otherwise.
    pub fn tags(&self) -> &[String] {
        self.enrichment.as_ref().map_or(&[], |e| &e.tags)
    }
}

/// A persisted dedup record: a fully enriched article plus bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredArticle {
    pub url_hash: String,
    pub article: Article,
    pub processed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enrichment() -> Enrichment {
        Enrichment {
            summary: "一句话摘要".into(),
            tags: vec!["LLM".into()],
            translation: "<p>译文</p>".into(),
            quotes: vec![],
            tone: Tone::Analytical,
            translated_title: String::new(),
        }
    }

    #[test]
    fn url_hash_is_sha256_hex() {
        let hash = url_hash("hello world");
        assert_eq!(hash.len(), 64);
        assert_eq!(
            hash,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn tone_parses_labels_and_names() {
        assert_eq!(Tone::parse("🧪 实验记录"), Some(Tone::Experimental));
        assert_eq!(Tone::parse("Critical"), Some(Tone::Critical));
        assert_eq!(Tone::parse("🤔"), Some(Tone::Reflective));
        assert_eq!(Tone::parse("分析"), Some(Tone::Analytical));
        assert_eq!(Tone::parse(" 💡 洞察 "), Some(Tone::Insightful));
        assert_eq!(Tone::parse("sarcastic"), None);
        assert_eq!(Tone::parse(""), None);
        assert_eq!(Tone::default(), Tone::Insightful);
    }

    #[test]
    fn unknown_label_kept_verbatim() {
        assert_eq!(Tone::from_label("📊 分析"), Tone::Analytical);
        assert_eq!(Tone::from_label(" 🔥 激烈 "), Tone::Other("🔥 激烈".into()));
        assert_eq!(Tone::from_label("🔥 激烈").label(), "🔥 激烈");
        assert_eq!(Tone::from_label("  "), Tone::Insightful);
    }

    #[test]
    fn quote_pair_uses_legacy_keys() {
        let pair = QuotePair {
            source: "Ship it.".into(),
            target: "发布吧。".into(),
        };
        let json = serde_json::to_string(&pair).unwrap();
        assert_eq!(json, r#"{"en":"Ship it.","zh":"发布吧。"}"#);
    }

    #[test]
    fn enrichment_validation() {
        assert!(enrichment().validate().is_ok());

        let mut partial = enrichment();
        partial.translation = "  ".into();
        partial.tags.clear();
        let err = partial.validate().unwrap_err().to_string();
        assert!(err.contains("tags"));
        assert!(err.contains("translation"));
    }

    #[test]
    fn display_title_prefers_translation() {
        let mut article = Article {
            url: "https://example.com/a".into(),
            title: "Original".into(),
            author: "Someone".into(),
            source_name: "Example".into(),
            published_at: None,
            content: "body".into(),
            enrichment: None,
        };
        assert_eq!(article.display_title(), "Original");
        assert!(article.tags().is_empty());

        let mut e = enrichment();
        e.translated_title = "译名".into();
        article.enrichment = Some(e);
        assert_eq!(article.display_title(), "译名");
        assert_eq!(article.tags(), ["LLM".to_string()]);
    }
}
