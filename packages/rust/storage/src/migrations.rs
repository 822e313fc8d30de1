//! SQL migration definitions for the article database.
//!
//! Versioned migrations run in order on open. Optional columns added after
//! the first release are reconciled separately by [`OPTIONAL_COLUMNS`], so a
//! database written by an older build (with or without the version table)
//! picks them up without failing on columns it already has.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial schema: articles keyed by url hash",
        sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version    INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- One row per processed article
CREATE TABLE IF NOT EXISTS articles (
    url_hash     TEXT PRIMARY KEY,
    url          TEXT NOT NULL,
    title        TEXT,
    author       TEXT,
    source_name  TEXT,
    published_at TEXT,
    content      TEXT,
    summary      TEXT,
    tags         TEXT,
    translation  TEXT,
    processed_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_articles_processed_at ON articles(processed_at);

INSERT OR IGNORE INTO schema_migrations (version) VALUES (1);
"#,
    }]
}

/// Columns added after the initial schema: `(name, declaration)`.
pub(crate) const OPTIONAL_COLUMNS: [(&str, &str); 3] = [
    ("quotes", "TEXT"),
    ("tone", "TEXT"),
    ("translated_title", "TEXT"),
];
