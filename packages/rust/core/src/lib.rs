//! Enrichment orchestration and the end-to-end digest pipeline.
//!
//! This crate ties together feed normalization, the article store, the AI
//! capability and rendering into a single run (`run_digest`), plus the
//! read-only re-render (`render_from_store`).

pub mod cluster;
pub mod digest;
pub mod enrichment;
pub mod llm;
pub mod pipeline;
pub mod processor;

pub use cluster::{DEFAULT_CATEGORY, categories_for, category_for_tag, cluster_by_topic};
pub use digest::{EMPTY_DIGEST, digest_items, dry_run_digest, generate_daily_digest, local_digest};
pub use enrichment::{
    DigestItem, EnrichmentCapability, OperationUsage, QuotesAndTone, UsageReport,
};
pub use llm::{Anthropic, ChatBackend, LlmCapability, OpenAiCompatible, create_capability};
pub use pipeline::{
    ProgressReporter, RunOptions, RunSummary, SilentProgress, render_from_store, run_digest,
};
pub use processor::{ProcessReport, process_articles};
