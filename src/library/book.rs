//! Book record model.

use serde::{Deserialize, Serialize};

/// A processed book: metadata plus the full chapter content, as persisted
/// to `book.json` inside the book's library folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookRecord {
    /// Book metadata.
    pub metadata: BookMetadata,

    /// Linear reading order. Chapter identity is positional.
    pub spine: Vec<ChapterEntry>,

    /// Hierarchical table of contents.
    #[serde(default)]
    pub toc: Vec<TocEntry>,
}

/// Book metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookMetadata {
    /// Book title.
    pub title: String,

    /// Authors (may be empty).
    pub authors: Vec<String>,

    /// Book description or summary.
    pub description: Option<String>,
}

/// One spine entry: the original relative path from the source document
/// plus the renderable chapter body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterEntry {
    /// Original relative path within the EPUB (e.g. "text/ch3.html").
    pub href: String,

    /// Renderable chapter body (HTML).
    pub content: String,
}

/// Table of contents entry, possibly nested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TocEntry {
    /// Display title.
    pub title: String,

    /// Target href within the book.
    pub href: String,

    /// Nested entries.
    #[serde(default)]
    pub children: Vec<TocEntry>,
}

impl BookRecord {
    /// Get display name for authors.
    pub fn author_display(&self) -> String {
        if self.metadata.authors.is_empty() {
            "Unknown".to_string()
        } else {
            self.metadata.authors.join(", ")
        }
    }
}

/// Lightweight book listing entry for the library view and upload response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookSummary {
    /// Library identifier (sanitized folder name).
    pub id: String,

    /// Book title.
    pub title: String,

    /// Joined author display string.
    pub author: String,

    /// Number of spine chapters.
    pub chapters: usize,

    /// Cover image URL, when one could be resolved.
    pub cover: Option<String>,

    /// Book description.
    pub description: String,
}
