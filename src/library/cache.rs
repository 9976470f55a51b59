//! Bounded in-memory cache of deserialized book records.
//!
//! Pure read-through derivative of the on-disk store: every entry can be
//! reconstructed from `book.json`, and the cache is never the sole source of
//! truth. Coherency relies entirely on mutating operations (ingest, delete)
//! calling `invalidate`; there is no file watcher.

use crate::library::book::BookRecord;
use crate::library::store::BookStore;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Default maximum number of cached book records.
pub const DEFAULT_CAPACITY: usize = 20;

/// LRU cache mapping a library identifier to its loaded record.
pub struct BookCache {
    store: BookStore,
    capacity: usize,
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<String, Arc<BookRecord>>,
    /// Keys ordered least to most recently used.
    recency: Vec<String>,
}

impl Inner {
    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.recency.iter().position(|k| k == key) {
            let key = self.recency.remove(pos);
            self.recency.push(key);
        }
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
        self.recency.retain(|k| k != key);
    }
}

impl BookCache {
    /// Create a cache over the given store with a fixed entry capacity.
    pub fn new(store: BookStore, capacity: usize) -> Self {
        Self {
            store,
            capacity: capacity.max(1),
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Load a book record, serving from memory when possible.
    ///
    /// Accepts a bare identifier or one qualified with the storage root.
    /// Missing or corrupt records are reported as a miss and never cached,
    /// so a fixed file is picked up on the next call.
    pub fn get(&self, id: &str) -> Option<Arc<BookRecord>> {
        let key = self.store.canonical_id(id);
        if key.is_empty() {
            return None;
        }

        {
            let mut inner = self.inner.lock();
            if let Some(record) = inner.entries.get(&key).cloned() {
                inner.touch(&key);
                return Some(record);
            }
        }

        // Miss: read storage outside the lock.
        let record = match self.store.read_record(&key) {
            Ok(record) => Arc::new(record),
            Err(e) => {
                tracing::warn!(book = %key, error = %e, "Failed to load book record");
                return None;
            }
        };

        let mut inner = self.inner.lock();
        if inner.entries.insert(key.clone(), record.clone()).is_some() {
            inner.touch(&key);
        } else {
            inner.recency.push(key);
            while inner.entries.len() > self.capacity {
                let evicted = inner.recency.remove(0);
                inner.entries.remove(&evicted);
                tracing::debug!(book = %evicted, "Evicted book record from cache");
            }
        }

        Some(record)
    }

    /// Drop one entry so the next `get` re-reads storage.
    pub fn invalidate(&self, id: &str) {
        let key = self.store.canonical_id(id);
        self.inner.lock().remove(&key);
    }

    /// Empty the cache entirely.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.recency.clear();
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
