//! Upload ingestion pipeline.
//!
//! Received -> Validated -> Staged -> Parsed -> Persisted -> Registered.
//! The staged temporary file lives in a scope guard and is removed on every
//! exit path. A re-upload that derives the same identifier replaces the
//! previous book wholesale, last writer wins.

use crate::error::{AppError, Result};
use crate::formats::BookParser;
use crate::library::Library;
use crate::library::book::BookSummary;
use crate::library::store::sanitize_book_id;
use std::io::Write;

/// Archive extension accepted by the pipeline.
const EPUB_EXT: &str = ".epub";

/// Ingest one uploaded archive into the library.
///
/// Blocking: callers inside the async runtime should run this on a
/// blocking task.
pub fn ingest(
    library: &Library,
    parser: &dyn BookParser,
    filename: &str,
    data: &[u8],
) -> Result<BookSummary> {
    // Validated
    if !filename.to_lowercase().ends_with(EPUB_EXT) {
        return Err(AppError::UnsupportedFormat(
            "Only EPUB files are allowed".into(),
        ));
    }

    // Staged: buffer the whole upload to a private temp file so parsing
    // never sees a partially consumed stream.
    let mut staged = tempfile::Builder::new()
        .prefix("shelfside-upload-")
        .suffix(EPUB_EXT)
        .tempfile()?;
    staged.write_all(data)?;
    staged.flush()?;

    let id = sanitize_book_id(filename);
    let out_dir = library.store().book_dir(&id);
    std::fs::create_dir_all(&out_dir)?;

    // Parsed
    let record = parser.parse(staged.path(), &out_dir).map_err(|e| match e {
        AppError::ProcessingFailed(_) => e,
        other => AppError::ProcessingFailed(other.to_string()),
    })?;

    // Persisted + Registered: write the canonical record and drop any stale
    // cache entry so the next read sees the new book.
    library.register(&id, &record)?;

    tracing::info!(
        book = %id,
        title = %record.metadata.title,
        chapters = record.spine.len(),
        "Ingested book"
    );

    Ok(library.summarize(&id, &record))
}
