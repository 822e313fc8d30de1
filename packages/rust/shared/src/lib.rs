//! Shared types, error model, and configuration for newsdigest.
//!
//! This crate is the foundation depended on by all other newsdigest crates.
//! It provides:
//! - [`NewsDigestError`], the unified error type
//! - Domain types ([`Article`], [`Enrichment`], [`Tone`], [`FeedSource`], [`StoredArticle`])
//! - Configuration ([`AppConfig`], config loading) and the built-in source sets

pub mod config;
pub mod error;
pub mod sources;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, FeedMetaConfig, LlmConfig, LlmProvider, ServerConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from, validate_api_key,
};
pub use error::{NewsDigestError, Result};
pub use sources::{SourceSet, builtin_sources};
pub use types::{
    Article, Enrichment, FeedSource, QuotePair, StoredArticle, Tone, UNTITLED, url_hash,
};
