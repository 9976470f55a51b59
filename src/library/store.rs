//! On-disk storage layout: one folder per book under the library root.
//!
//! Layout: `<root>/<id>/book.json` plus `<root>/<id>/images/*`. The folder
//! name is the library identifier, always ending in `_data`.

use crate::error::{AppError, Result};
use crate::library::book::BookRecord;
use std::path::{Path, PathBuf};

/// Suffix appended to every sanitized book folder name.
pub const ID_SUFFIX: &str = "_data";

/// Filename of the serialized book record inside a book folder.
pub const RECORD_FILE: &str = "book.json";

/// Derive a library identifier from an uploaded filename.
///
/// Strips the archive extension, keeps only alphanumerics, spaces, hyphens
/// and underscores, turns spaces into underscores and appends `_data`.
/// The derivation is lossy: two different filenames can map to the same
/// identifier, in which case the later upload wins wholesale.
pub fn sanitize_book_id(filename: &str) -> String {
    let stem = filename
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(filename);

    let cleaned: String = stem
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();

    let name = cleaned.trim().replace(' ', "_");
    format!("{}{}", name, ID_SUFFIX)
}

/// Reduce a path-like string to its final component.
///
/// Applied to every identifier and image name before building a filesystem
/// path, so traversal segments never reach the disk.
pub fn safe_component(name: &str) -> String {
    Path::new(name)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string()
}

/// Filesystem access for the directory-per-book layout.
#[derive(Debug, Clone)]
pub struct BookStore {
    root: PathBuf,
}

impl BookStore {
    /// Create a store rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The library root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Normalize an identifier to its canonical folder name.
    ///
    /// Accepts both a bare identifier and one already qualified with the
    /// storage root prefix; both forms map to the same folder.
    pub fn canonical_id(&self, id: &str) -> String {
        let path = Path::new(id);
        if path.starts_with(&self.root) {
            return path
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string();
        }
        safe_component(id)
    }

    /// Directory holding one book's record and assets.
    pub fn book_dir(&self, id: &str) -> PathBuf {
        self.root.join(self.canonical_id(id))
    }

    /// Path to the serialized book record.
    pub fn record_path(&self, id: &str) -> PathBuf {
        self.book_dir(id).join(RECORD_FILE)
    }

    /// Path to a book's extracted images directory.
    pub fn images_dir(&self, id: &str) -> PathBuf {
        self.book_dir(id).join("images")
    }

    /// Path to one image inside a book's images directory, both components
    /// reduced to their base names.
    pub fn image_path(&self, id: &str, image_name: &str) -> PathBuf {
        self.images_dir(id).join(safe_component(image_name))
    }

    /// Deserialize the book record for an identifier.
    pub fn read_record(&self, id: &str) -> Result<BookRecord> {
        let path = self.record_path(id);
        let data = std::fs::read(&path)?;
        serde_json::from_slice(&data)
            .map_err(|e| AppError::Internal(format!("corrupt record {}: {}", path.display(), e)))
    }

    /// Serialize a book record into its folder, overwriting any previous one.
    pub fn write_record(&self, id: &str, record: &BookRecord) -> Result<()> {
        let dir = self.book_dir(id);
        std::fs::create_dir_all(&dir)?;
        let data = serde_json::to_vec(record)
            .map_err(|e| AppError::Internal(format!("serialize record: {}", e)))?;
        std::fs::write(dir.join(RECORD_FILE), data)?;
        Ok(())
    }

    /// List identifiers of all book folders under the root, sorted.
    pub fn scan_ids(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(&self.root) else {
            return Vec::new();
        };

        let mut ids: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_dir())
            .filter_map(|e| e.file_name().to_str().map(String::from))
            .filter(|name| name.ends_with(ID_SUFFIX))
            .collect();

        ids.sort();
        ids
    }

    /// Remove a book folder recursively.
    pub fn remove(&self, id: &str) -> Result<()> {
        let dir = self.book_dir(id);
        if !dir.exists() {
            return Err(AppError::NotFound(format!("Book not found: {}", id)));
        }
        std::fs::remove_dir_all(&dir)?;
        Ok(())
    }

    /// Pick a cover image filename for a book.
    ///
    /// The `images/` listing is sorted first so the choice is deterministic:
    /// the first filename containing "cover" (case-insensitive) wins,
    /// otherwise the lexicographically first image, otherwise none.
    pub fn find_cover(&self, id: &str) -> Option<String> {
        let entries = std::fs::read_dir(self.images_dir(id)).ok()?;

        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .filter_map(|e| e.file_name().to_str().map(String::from))
            .collect();
        names.sort();

        names
            .iter()
            .find(|name| name.to_lowercase().contains("cover"))
            .cloned()
            .or_else(|| names.first().cloned())
    }
}
