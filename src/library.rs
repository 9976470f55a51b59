//! Library service: storage, record cache and book enumeration.

pub mod book;
pub mod cache;
pub mod chapter;
pub mod store;

use crate::error::Result;
use crate::library::book::{BookRecord, BookSummary};
use crate::library::cache::BookCache;
use crate::library::store::BookStore;
use std::path::Path;
use std::sync::Arc;

/// Single authority over the book store and its cache.
///
/// Every mutating operation (ingest, delete) goes through this service so
/// the cache invalidation that keeps memory and disk coherent cannot be
/// missed at a call site.
pub struct Library {
    store: BookStore,
    cache: BookCache,
}

impl Library {
    /// Create a library over a storage root with a bounded record cache.
    pub fn new(root: impl Into<std::path::PathBuf>, cache_capacity: usize) -> Self {
        let store = BookStore::new(root);
        let cache = BookCache::new(store.clone(), cache_capacity);
        Self { store, cache }
    }

    /// The underlying store.
    pub fn store(&self) -> &BookStore {
        &self.store
    }

    /// The record cache.
    pub fn cache(&self) -> &BookCache {
        &self.cache
    }

    /// Load one book through the cache.
    pub fn load(&self, id: &str) -> Option<Arc<BookRecord>> {
        self.cache.get(id)
    }

    /// Persist a freshly parsed record and register it with the cache.
    ///
    /// Invalidation rather than pre-warming: the next read re-loads the new
    /// record from disk, so a half-written book is never served.
    pub fn register(&self, id: &str, record: &BookRecord) -> Result<()> {
        self.store.write_record(id, record)?;
        self.cache.invalidate(id);
        Ok(())
    }

    /// Delete a book folder and drop its cache entry.
    pub fn delete_book(&self, id: &str) -> Result<()> {
        self.store.remove(id)?;
        self.cache.invalidate(id);
        tracing::info!(book = %self.store.canonical_id(id), "Deleted book");
        Ok(())
    }

    /// Cover URL for a book, when an image can be resolved.
    pub fn cover_url(&self, id: &str) -> Option<String> {
        self.store
            .find_cover(id)
            .map(|name| format!("/library/{}/cover/{}", id, name))
    }

    /// Build the listing summary for one loaded book.
    pub fn summarize(&self, id: &str, record: &BookRecord) -> BookSummary {
        BookSummary {
            id: id.to_string(),
            title: record.metadata.title.clone(),
            author: record.author_display(),
            chapters: record.spine.len(),
            cover: self.cover_url(id),
            description: record.metadata.description.clone().unwrap_or_default(),
        }
    }

    /// Enumerate all books, optionally filtered by a search term.
    ///
    /// Entries that fail to load are skipped so one corrupt book never
    /// breaks the whole listing. The filter is a case-insensitive substring
    /// match against the title or the joined author string. Results are
    /// sorted ascending by title, case-insensitively.
    pub fn list_books(&self, search: Option<&str>) -> Vec<BookSummary> {
        let mut books: Vec<BookSummary> = self
            .store
            .scan_ids()
            .iter()
            .filter_map(|id| self.load(id).map(|record| self.summarize(id, &record)))
            .collect();

        if let Some(term) = search {
            let term = term.to_lowercase();
            books.retain(|b| {
                b.title.to_lowercase().contains(&term) || b.author.to_lowercase().contains(&term)
            });
        }

        books.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()));
        books
    }

    /// Path to one image of a book, sanitized to base-name components.
    pub fn image_path(&self, id: &str, image_name: &str) -> std::path::PathBuf {
        self.store.image_path(id, image_name)
    }

    /// Whether a book folder exists on disk.
    pub fn exists(&self, id: &str) -> bool {
        self.store.book_dir(id).is_dir()
    }

    /// The storage root.
    pub fn root(&self) -> &Path {
        self.store.root()
    }
}
