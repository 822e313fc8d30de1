//! Feed ingestion: download syndication feeds and normalize their entries
//! into [`Article`](newsdigest_shared::Article) records.
//!
//! Sources are processed strictly one after another with a configurable
//! pause in between. Entries with short bodies get a full-text fetch of the
//! linked page, reduced to its main content before conversion.

mod fetch;
mod normalize;

pub use fetch::HttpFetcher;
pub use normalize::{FeedBatch, FeedNormalizer, NormalizeOptions, in_window};
