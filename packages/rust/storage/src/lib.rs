//! libSQL storage layer for processed articles (the dedup store).
//!
//! The [`Storage`] struct wraps a local libSQL database holding one record per
//! fully enriched article, keyed by the SHA-256 of its URL. It is the sole
//! arbiter of whether an article has already been processed.
//!
//! **Access rules:**
//! - `run`: read-write (sole writer) via [`Storage::open`]
//! - `render`: read-only via [`Storage::open_readonly`]

mod migrations;

use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use libsql::{Connection, Database, params};
use newsdigest_shared::{
    Article, Enrichment, NewsDigestError, QuotePair, Result, StoredArticle, Tone, url_hash,
};
use tracing::{debug, warn};

const SELECT_COLUMNS: &str = "url_hash, url, title, author, source_name, published_at, content, \
     summary, tags, translation, quotes, tone, translated_title, processed_at";

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    readonly: bool,
}

impl Storage {
    /// Open or create a database at `path` in read-write mode.
    ///
    /// Applies pending migrations and adds any optional columns missing from
    /// a database written by an older build.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| NewsDigestError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| NewsDigestError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| NewsDigestError::Storage(e.to_string()))?;

        let storage = Self {
            db,
            conn,
            readonly: false,
        };
        storage.run_migrations().await?;
        storage.ensure_optional_columns().await?;
        Ok(storage)
    }

    /// Open an existing database at `path` in read-only mode.
    pub async fn open_readonly(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(NewsDigestError::Storage(format!(
                "database not found at {}",
                path.display()
            )));
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| NewsDigestError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| NewsDigestError::Storage(e.to_string()))?;

        Ok(Self {
            db,
            conn,
            readonly: true,
        })
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn
                    .execute_batch(migration.sql)
                    .await
                    .map_err(|e| {
                        NewsDigestError::Storage(format!(
                            "migration v{} failed: {e}",
                            migration.version
                        ))
                    })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Add optional columns the `articles` table is missing.
    async fn ensure_optional_columns(&self) -> Result<()> {
        let existing = self.column_names("articles").await?;

        for (name, decl) in migrations::OPTIONAL_COLUMNS {
            if existing.iter().any(|c| c == name) {
                continue;
            }
            let sql = format!("ALTER TABLE articles ADD COLUMN {name} {decl}");
            match self.conn.execute(&sql, params![]).await {
                Ok(_) => tracing::info!(column = name, "added missing column"),
                Err(e) if e.to_string().contains("duplicate column") => {
                    debug!(column = name, "column already present");
                }
                Err(e) => {
                    return Err(NewsDigestError::Storage(format!(
                        "adding column {name} failed: {e}"
                    )));
                }
            }
        }
        Ok(())
    }

    async fn column_names(&self, table: &str) -> Result<Vec<String>> {
        let mut rows = self
            .conn
            .query(&format!("PRAGMA table_info({table})"), params![])
            .await
            .map_err(|e| NewsDigestError::Storage(e.to_string()))?;

        let mut names = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            names.push(
                row.get::<String>(1)
                    .map_err(|e| NewsDigestError::Storage(e.to_string()))?,
            );
        }
        Ok(names)
    }

    /// Ensure we're in read-write mode before writing.
    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(NewsDigestError::Storage(
                "database is opened in read-only mode".into(),
            ));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Article operations
    // -----------------------------------------------------------------------

    /// Whether a record exists for this URL, regardless of its contents.
    pub async fn is_processed(&self, url: &str) -> Result<bool> {
        let mut rows = self
            .conn
            .query(
                "SELECT 1 FROM articles WHERE url_hash = ?1 LIMIT 1",
                params![url_hash(url)],
            )
            .await
            .map_err(|e| NewsDigestError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(row) => Ok(row.is_some()),
            Err(e) => Err(NewsDigestError::Storage(e.to_string())),
        }
    }

    /// Persist a fully enriched article, replacing any previous record for its URL.
    ///
    /// The processing timestamp is set to now.
    pub async fn save(&self, article: &Article) -> Result<()> {
        self.upsert(article, Utc::now()).await
    }

    async fn upsert(&self, article: &Article, processed_at: DateTime<Utc>) -> Result<()> {
        self.check_writable()?;

        let enrichment = article.enrichment.as_ref().ok_or_else(|| {
            NewsDigestError::validation(format!("refusing to save unenriched {}", article.url))
        })?;
        enrichment.validate()?;

        let tags = serde_json::to_string(&enrichment.tags)
            .map_err(|e| NewsDigestError::Storage(format!("encode tags: {e}")))?;
        let quotes = serde_json::to_string(&enrichment.quotes)
            .map_err(|e| NewsDigestError::Storage(format!("encode quotes: {e}")))?;
        let published_at = article
            .published_at
            .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true));

        self.conn
            .execute(
                "INSERT INTO articles (url_hash, url, title, author, source_name, published_at,
                     content, summary, tags, translation, quotes, tone, translated_title, processed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
                 ON CONFLICT(url_hash) DO UPDATE SET
                   url = excluded.url,
                   title = excluded.title,
                   author = excluded.author,
                   source_name = excluded.source_name,
                   published_at = excluded.published_at,
                   content = excluded.content,
                   summary = excluded.summary,
                   tags = excluded.tags,
                   translation = excluded.translation,
                   quotes = excluded.quotes,
                   tone = excluded.tone,
                   translated_title = excluded.translated_title,
                   processed_at = excluded.processed_at",
                params![
                    article.url_hash(),
                    article.url.as_str(),
                    article.title.as_str(),
                    article.author.as_str(),
                    article.source_name.as_str(),
                    published_at.as_deref(),
                    article.content.as_str(),
                    enrichment.summary.as_str(),
                    tags,
                    enrichment.translation.as_str(),
                    quotes,
                    enrichment.tone.label(),
                    enrichment.translated_title.as_str(),
                    processed_at.to_rfc3339_opts(SecondsFormat::Millis, true),
                ],
            )
            .await
            .map_err(|e| NewsDigestError::Storage(e.to_string()))?;

        debug!(url = %article.url, "saved article");
        Ok(())
    }

    /// Fetch the record for a URL, if any.
    pub async fn get(&self, url: &str) -> Result<Option<StoredArticle>> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {SELECT_COLUMNS} FROM articles WHERE url_hash = ?1"),
                params![url_hash(url)],
            )
            .await
            .map_err(|e| NewsDigestError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_stored(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(NewsDigestError::Storage(e.to_string())),
        }
    }

    /// Records processed on `date` (UTC), newest publication first, undated last.
    pub async fn records_for(&self, date: NaiveDate) -> Result<Vec<StoredArticle>> {
        let prefix = format!("{}%", date.format("%Y-%m-%d"));
        let mut rows = self
            .conn
            .query(
                &format!(
                    "SELECT {SELECT_COLUMNS} FROM articles
                     WHERE processed_at LIKE ?1
                     ORDER BY published_at IS NULL, published_at DESC, url_hash"
                ),
                params![prefix],
            )
            .await
            .map_err(|e| NewsDigestError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            results.push(row_to_stored(&row)?);
        }
        Ok(results)
    }

    /// Total number of stored records.
    pub async fn count(&self) -> Result<u64> {
        let mut rows = self
            .conn
            .query("SELECT COUNT(*) FROM articles", params![])
            .await
            .map_err(|e| NewsDigestError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(row.get::<u64>(0).unwrap_or(0)),
            Ok(None) => Ok(0),
            Err(e) => Err(NewsDigestError::Storage(e.to_string())),
        }
    }
}

/// Convert a database row (in [`SELECT_COLUMNS`] order) to a [`StoredArticle`].
fn row_to_stored(row: &libsql::Row) -> Result<StoredArticle> {
    let url: String = row
        .get(1)
        .map_err(|e| NewsDigestError::Storage(e.to_string()))?;

    let tags = decode_json::<Vec<String>>(row.get::<String>(8).ok(), &url, "tags");
    let quotes = decode_json::<Vec<QuotePair>>(row.get::<String>(10).ok(), &url, "quotes");
    let tone = row
        .get::<String>(11)
        .ok()
        .map(|t| Tone::from_label(&t))
        .unwrap_or_default();

    let processed_raw: String = row
        .get(13)
        .map_err(|e| NewsDigestError::Storage(e.to_string()))?;
    let processed_at = parse_timestamp(&processed_raw).ok_or_else(|| {
        NewsDigestError::Storage(format!("invalid processed_at '{processed_raw}'"))
    })?;

    let source_name = row.get::<String>(4).unwrap_or_default();

    Ok(StoredArticle {
        url_hash: row
            .get::<String>(0)
            .map_err(|e| NewsDigestError::Storage(e.to_string()))?,
        article: Article {
            title: row.get::<String>(2).unwrap_or_default(),
            author: row
                .get::<String>(3)
                .ok()
                .filter(|a| !a.is_empty())
                .unwrap_or_else(|| source_name.clone()),
            source_name,
            published_at: row
                .get::<String>(5)
                .ok()
                .and_then(|s| parse_timestamp(&s)),
            content: row.get::<String>(6).unwrap_or_default(),
            enrichment: Some(Enrichment {
                summary: row.get::<String>(7).unwrap_or_default(),
                tags,
                translation: row.get::<String>(9).unwrap_or_default(),
                quotes,
                tone,
                translated_title: row.get::<String>(12).unwrap_or_default(),
            }),
            url,
        },
        processed_at,
    })
}

fn decode_json<T: serde::de::DeserializeOwned + Default>(
    raw: Option<String>,
    url: &str,
    field: &str,
) -> T {
    let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
        return T::default();
    };
    serde_json::from_str(&raw).unwrap_or_else(|e| {
        warn!(url, field, error = %e, "stored value is not valid JSON, using empty");
        T::default()
    })
}

/// RFC 3339, or a naive ISO-8601 timestamp (as written by older builds) read as UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
