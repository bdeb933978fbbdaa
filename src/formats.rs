use std::io::Write as _;
use std::path::Path;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

/// One successfully processed book as stored in the result JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecord {
    pub id: u64,
    pub title: String,
    pub author: String,
    pub img_src: Option<String>,
    pub book_path: Option<String>,
    pub comments: Vec<String>,
    pub genres: Vec<String>,
}

/// Writes `records` as a pretty JSON array, replacing `path` atomically.
pub fn write_books_json(path: &Path, records: &[BookRecord]) -> anyhow::Result<()> {
    let parent_dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent_dir)
        .with_context(|| format!("create result dir: {}", parent_dir.display()))?;

    let mut file = tempfile::NamedTempFile::new_in(parent_dir)
        .with_context(|| format!("create temp file in {}", parent_dir.display()))?;
    serde_json::to_writer_pretty(&mut file, records).context("serialize book records")?;
    file.write_all(b"\n").context("write result newline")?;
    file.flush().context("flush result json")?;
    file.persist(path)
        .with_context(|| format!("persist result json: {}", path.display()))?;

    Ok(())
}

pub fn read_books_json(path: &Path) -> anyhow::Result<Vec<BookRecord>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read result json: {}", path.display()))?;
    serde_json::from_str(&raw).context("parse book records")
}
