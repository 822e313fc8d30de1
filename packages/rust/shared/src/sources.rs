//! Built-in feed source sets.

use serde::{Deserialize, Serialize};

use crate::error::NewsDigestError;
use crate::types::FeedSource;

/// Which list of sources a run polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceSet {
    /// Three sources, enough to exercise the whole pipeline.
    Mvp,
    /// Every built-in source.
    All,
    /// The `[[sources]]` list from the config file.
    Config,
}

impl std::str::FromStr for SourceSet {
    type Err = NewsDigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mvp" => Ok(Self::Mvp),
            "all" => Ok(Self::All),
            "config" => Ok(Self::Config),
            other => Err(NewsDigestError::config(format!(
                "unknown source set '{other}' (expected mvp, all or config)"
            ))),
        }
    }
}

/// Built-in sources for a set. `Config` has no built-ins and yields the MVP set.
pub fn builtin_sources(set: SourceSet) -> Vec<FeedSource> {
    match set {
        SourceSet::All => all_sources(),
        SourceSet::Mvp | SourceSet::Config => mvp_sources(),
    }
}

fn mvp_sources() -> Vec<FeedSource> {
    vec![
        FeedSource::new(
            "Simon Willison",
            "https://simonwillison.net/atom/everything/",
            "AI工具",
            "AI工具实操",
        ),
        FeedSource::new(
            "Gary Marcus",
            "https://garymarcus.substack.com/feed",
            "AI评论",
            "AI怀疑派视角",
        ),
        FeedSource::new(
            "TLDR AI",
            "https://tldr.tech/api/rss/ai",
            "AI综合",
            "每日AI/ML/论文短摘要",
        ),
    ]
}

fn all_sources() -> Vec<FeedSource> {
    vec![
        FeedSource::new(
            "Simon Willison",
            "https://simonwillison.net/atom/everything/",
            "AI工具",
            "AI工具实操",
        ),
        FeedSource::new(
            "Mitchell Hashimoto",
            "https://mitchellh.com/feed.xml",
            "工程",
            "底层工程原理",
        ),
        FeedSource::new("Antirez", "http://antirez.com/rss", "工程", "系统设计"),
        FeedSource::new(
            "Andrej Karpathy",
            "https://karpathy.bearblog.dev/feed/",
            "AI研究",
            "AI研究+教育",
        ),
        FeedSource::new(
            "Dan Abramov",
            "https://overreacted.io/rss.xml",
            "前端",
            "编程思维",
        ),
        FeedSource::new(
            "Dwarkesh Patel",
            "https://www.dwarkesh.com/feed",
            "AI访谈",
            "深度AI访谈，含完整文字稿",
        ),
        FeedSource::new(
            "Gary Marcus",
            "https://garymarcus.substack.com/feed",
            "AI评论",
            "AI怀疑派视角",
        ),
        FeedSource::new(
            "Lenny's Newsletter",
            "https://www.lennysnewsletter.com/feed",
            "产品",
            "仅免费部分，产品增长",
        ),
        FeedSource::new(
            "Zara Zhang",
            "https://zarazhang.substack.com/feed",
            "AI人文",
            "AI+人文视角",
        ),
        FeedSource::new(
            "Construction Physics",
            "https://www.construction-physics.com/feed",
            "行业分析",
            "工程创新与行业变革",
        ),
        FeedSource::new(
            "Latent Space",
            "https://latent.space/feed",
            "AI工程",
            "AI工程师深度访谈",
        ),
        FeedSource::new(
            "TLDR AI",
            "https://tldr.tech/api/rss/ai",
            "AI综合",
            "每日AI/ML/论文短摘要",
        ),
    ]
}
