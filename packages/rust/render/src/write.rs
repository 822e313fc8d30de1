//! Output files, written atomically.

use std::path::{Path, PathBuf};

use newsdigest_shared::{NewsDigestError, Result};
use tracing::{debug, info, instrument};

pub const DIGEST_FEED_FILE: &str = "daily-digest.xml";
pub const ARTICLES_FEED_FILE: &str = "articles.xml";
pub const PAGE_FILE: &str = "index.html";

/// The three rendered documents of one run.
#[derive(Debug, Clone)]
pub struct RenderedOutputs {
    pub digest_feed: String,
    pub articles_feed: String,
    pub page: String,
}

/// Write every output into `dir`, creating it if needed.
///
/// Each file is written to a hidden temp file first and renamed into place,
/// so readers never observe a partially written document.
#[instrument(skip_all, fields(dir = %dir.display()))]
pub fn write_outputs(dir: &Path, outputs: &RenderedOutputs) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir).map_err(|e| NewsDigestError::io(dir, e))?;

    let files = [
        (DIGEST_FEED_FILE, &outputs.digest_feed),
        (ARTICLES_FEED_FILE, &outputs.articles_feed),
        (PAGE_FILE, &outputs.page),
    ];

    let mut written = Vec::with_capacity(files.len());
    for (filename, content) in files {
        let target = dir.join(filename);
        let temp = dir.join(format!(".{filename}.tmp"));

        std::fs::write(&temp, content).map_err(|e| NewsDigestError::io(&temp, e))?;
        std::fs::rename(&temp, &target).map_err(|e| NewsDigestError::io(&target, e))?;

        debug!(file = %filename, size = content.len(), "wrote output");
        written.push(target);
    }

    info!(count = written.len(), "outputs written");
    Ok(written)
}
