use crate::config::Config;
use crate::error::AppError;
use crate::formats::BookParser;
use crate::ingest::ingest;
use crate::library::Library;
use crate::library::book::{BookMetadata, BookRecord, ChapterEntry};
use crate::library::cache::BookCache;
use crate::library::chapter::resolve;
use crate::library::store::{BookStore, safe_component, sanitize_book_id};
use crate::translate::{Provider, TranslateRequest, language_name, translate};
use std::path::Path;
use tempfile::TempDir;

fn record(title: &str, hrefs: &[&str]) -> BookRecord {
    BookRecord {
        metadata: BookMetadata {
            title: title.to_string(),
            authors: vec!["Jane Doe".to_string()],
            description: Some(format!("About {}", title)),
        },
        spine: hrefs
            .iter()
            .map(|href| ChapterEntry {
                href: href.to_string(),
                content: format!("<p>{}</p>", href),
            })
            .collect(),
        toc: Vec::new(),
    }
}

fn seed(store: &BookStore, id: &str, rec: &BookRecord) {
    store.write_record(id, rec).unwrap();
}

fn record_json(rec: &BookRecord) -> String {
    serde_json::to_string(rec).unwrap()
}

/// Parser stub returning a fixed record, as the pipeline contract allows.
struct FixedParser(BookRecord);

impl BookParser for FixedParser {
    fn parse(&self, _archive: &Path, out_dir: &Path) -> crate::error::Result<BookRecord> {
        std::fs::create_dir_all(out_dir.join("images"))?;
        Ok(self.0.clone())
    }
}

/// Parser stub rejecting every archive.
struct FailingParser;

impl BookParser for FailingParser {
    fn parse(&self, _archive: &Path, _out_dir: &Path) -> crate::error::Result<BookRecord> {
        Err(AppError::ProcessingFailed("malformed archive".into()))
    }
}

// ============================================================================
// IDENTIFIERS
// ============================================================================

#[test]
fn sanitize_strips_punctuation_and_appends_suffix() {
    assert_eq!(sanitize_book_id("My Book!!.epub"), "My_Book_data");
    assert_eq!(sanitize_book_id("plain.epub"), "plain_data");
    assert_eq!(sanitize_book_id("a-b_c 1.epub"), "a-b_c_1_data");
}

#[test]
fn sanitize_is_lossy_and_collides() {
    assert_eq!(
        sanitize_book_id("My Book!.epub"),
        sanitize_book_id("My Book?.epub")
    );
}

#[test]
fn safe_component_blocks_traversal() {
    assert_eq!(safe_component("../../etc/passwd"), "passwd");
    assert_eq!(safe_component("cover.jpg"), "cover.jpg");
    assert_eq!(safe_component("a/b/c.png"), "c.png");
}

#[test]
fn canonical_id_accepts_root_qualified_form() {
    let dir = TempDir::new().unwrap();
    let store = BookStore::new(dir.path());

    let qualified = dir.path().join("Alpha_data");
    assert_eq!(store.canonical_id(qualified.to_str().unwrap()), "Alpha_data");
    assert_eq!(store.canonical_id("Alpha_data"), "Alpha_data");
}

// ============================================================================
// CACHE
// ============================================================================

#[test]
fn cache_invalidate_rereads_equal_record() {
    let dir = TempDir::new().unwrap();
    let store = BookStore::new(dir.path());
    let cache = BookCache::new(store.clone(), 20);

    let rec = record("Alpha", &["ch1.html", "ch2.html"]);
    seed(&store, "Alpha_data", &rec);

    let first = cache.get("Alpha_data").unwrap();
    cache.invalidate("Alpha_data");
    let second = cache.get("Alpha_data").unwrap();

    assert_eq!(record_json(&first), record_json(&second));
    assert_eq!(record_json(&second), record_json(&rec));
}

#[test]
fn cache_serves_stale_until_invalidated() {
    let dir = TempDir::new().unwrap();
    let store = BookStore::new(dir.path());
    let cache = BookCache::new(store.clone(), 20);

    seed(&store, "Alpha_data", &record("Old Title", &["ch1.html"]));
    assert_eq!(cache.get("Alpha_data").unwrap().metadata.title, "Old Title");

    seed(&store, "Alpha_data", &record("New Title", &["ch1.html"]));
    // No invalidation yet: the cached record is still served.
    assert_eq!(cache.get("Alpha_data").unwrap().metadata.title, "Old Title");

    cache.invalidate("Alpha_data");
    assert_eq!(cache.get("Alpha_data").unwrap().metadata.title, "New Title");
}

#[test]
fn cache_both_id_forms_share_one_slot() {
    let dir = TempDir::new().unwrap();
    let store = BookStore::new(dir.path());
    let cache = BookCache::new(store.clone(), 20);

    seed(&store, "Alpha_data", &record("Alpha", &["ch1.html"]));

    let qualified = dir.path().join("Alpha_data");
    assert!(cache.get(qualified.to_str().unwrap()).is_some());
    assert!(cache.get("Alpha_data").is_some());
    assert_eq!(cache.len(), 1);
}

#[test]
fn cache_missing_book_is_a_miss() {
    let dir = TempDir::new().unwrap();
    let store = BookStore::new(dir.path());
    let cache = BookCache::new(store, 20);

    assert!(cache.get("Nope_data").is_none());
    assert!(cache.is_empty());
}

#[test]
fn cache_never_caches_corrupt_record() {
    let dir = TempDir::new().unwrap();
    let store = BookStore::new(dir.path());
    let cache = BookCache::new(store.clone(), 20);

    let book_dir = dir.path().join("Broken_data");
    std::fs::create_dir_all(&book_dir).unwrap();
    std::fs::write(book_dir.join("book.json"), b"not json at all").unwrap();

    assert!(cache.get("Broken_data").is_none());
    assert!(cache.is_empty());

    // Fixing the file externally is picked up on the very next call.
    seed(&store, "Broken_data", &record("Fixed", &["ch1.html"]));
    assert_eq!(cache.get("Broken_data").unwrap().metadata.title, "Fixed");
}

#[test]
fn cache_evicts_least_recently_used() {
    let dir = TempDir::new().unwrap();
    let store = BookStore::new(dir.path());
    let cache = BookCache::new(store.clone(), 2);

    for id in ["A_data", "B_data", "C_data"] {
        seed(&store, id, &record(id, &["ch1.html"]));
    }

    cache.get("A_data").unwrap();
    cache.get("B_data").unwrap();
    // Touch A so B becomes least recently used, then overflow with C.
    cache.get("A_data").unwrap();
    cache.get("C_data").unwrap();

    assert_eq!(cache.len(), 2);

    // A survived the eviction: removing its file proves it is served from
    // memory, while B was evicted and now misses against the empty disk.
    std::fs::remove_dir_all(dir.path().join("A_data")).unwrap();
    std::fs::remove_dir_all(dir.path().join("B_data")).unwrap();
    assert!(cache.get("A_data").is_some());
    assert!(cache.get("B_data").is_none());
}

#[test]
fn cache_clear_empties_everything() {
    let dir = TempDir::new().unwrap();
    let store = BookStore::new(dir.path());
    let cache = BookCache::new(store.clone(), 20);

    seed(&store, "Alpha_data", &record("Alpha", &["ch1.html"]));
    cache.get("Alpha_data").unwrap();
    assert_eq!(cache.len(), 1);

    cache.clear();
    assert!(cache.is_empty());
    assert!(cache.get("Alpha_data").is_some());
}

// ============================================================================
// CHAPTER RESOLUTION
// ============================================================================

#[test]
fn resolve_every_index_has_correct_neighbors() {
    let book = record("Nav", &["a.html", "b.html", "c.html", "d.html"]);
    let len = book.spine.len();

    for i in 0..len {
        let pos = resolve(&book, &i.to_string()).unwrap();
        assert_eq!(pos.index, i);
        assert_eq!(pos.prev, if i > 0 { Some(i - 1) } else { None });
        assert_eq!(pos.next, if i + 1 < len { Some(i + 1) } else { None });
    }
}

#[test]
fn resolve_out_of_range_indices_fail() {
    let book = record("Nav", &["a.html", "b.html"]);

    assert!(matches!(
        resolve(&book, "-1"),
        Err(AppError::OutOfRange { index: -1, len: 2 })
    ));
    assert!(matches!(
        resolve(&book, "2"),
        Err(AppError::OutOfRange { index: 2, len: 2 })
    ));
}

#[test]
fn resolve_href_exact_and_suffix_match() {
    let book = record("Nav", &["text/ch1.html", "text/ch2.html", "text/ch3.html"]);

    assert_eq!(resolve(&book, "text/ch3.html").unwrap().index, 2);
    assert_eq!(resolve(&book, "ch3.html").unwrap().index, 2);
    assert!(matches!(
        resolve(&book, "nonexistent.html"),
        Err(AppError::NotFound(_))
    ));
}

#[test]
fn resolve_exact_match_beats_suffix_match() {
    let book = record("Nav", &["intro/ch1.html", "ch1.html"]);

    // "ch1.html" suffix-matches index 0 but exact-matches index 1.
    assert_eq!(resolve(&book, "ch1.html").unwrap().index, 1);
    // Among suffix matches only, spine order wins.
    assert_eq!(resolve(&book, "1.html").unwrap().index, 0);
}

// ============================================================================
// INGESTION
// ============================================================================

#[test]
fn ingest_derives_id_and_appears_in_listing() {
    let dir = TempDir::new().unwrap();
    let library = Library::new(dir.path(), 20);
    let parser = FixedParser(record("My Book", &["c1.html", "c2.html", "c3.html"]));

    let summary = ingest(&library, &parser, "My Book!!.epub", b"fake-bytes").unwrap();
    assert_eq!(summary.id, "My_Book_data");
    assert_eq!(summary.chapters, 3);
    assert!(dir.path().join("My_Book_data/book.json").is_file());

    let books = library.list_books(None);
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].chapters, 3);
}

#[test]
fn ingest_rejects_wrong_extension() {
    let dir = TempDir::new().unwrap();
    let library = Library::new(dir.path(), 20);
    let parser = FixedParser(record("X", &["c1.html"]));

    let result = ingest(&library, &parser, "notes.pdf", b"data");
    assert!(matches!(result, Err(AppError::UnsupportedFormat(_))));
    assert!(library.list_books(None).is_empty());
}

#[test]
fn ingest_surfaces_parser_failure() {
    let dir = TempDir::new().unwrap();
    let library = Library::new(dir.path(), 20);

    let result = ingest(&library, &FailingParser, "bad.epub", b"zip-ish");
    assert!(matches!(result, Err(AppError::ProcessingFailed(_))));
}

#[test]
fn reingest_replaces_record_wholesale() {
    let dir = TempDir::new().unwrap();
    let library = Library::new(dir.path(), 20);

    let first = FixedParser(record("Draft", &["c1.html", "c2.html", "c3.html"]));
    ingest(&library, &first, "Same Name.epub", b"v1").unwrap();
    assert_eq!(library.load("Same_Name_data").unwrap().spine.len(), 3);

    let second = FixedParser(record("Final", &["c1.html", "c2.html", "c3.html", "c4.html", "c5.html"]));
    ingest(&library, &second, "Same Name.epub", b"v2").unwrap();

    let loaded = library.load("Same_Name_data").unwrap();
    assert_eq!(loaded.spine.len(), 5);
    assert_eq!(loaded.metadata.title, "Final");
}

// ============================================================================
// ENUMERATION
// ============================================================================

#[test]
fn list_books_sorts_by_title_case_insensitively() {
    let dir = TempDir::new().unwrap();
    let library = Library::new(dir.path(), 20);

    seed(library.store(), "B_data", &record("banana", &["c.html"]));
    seed(library.store(), "A_data", &record("Apple", &["c.html"]));
    seed(library.store(), "C_data", &record("Cherry", &["c.html"]));

    let titles: Vec<String> = library
        .list_books(None)
        .into_iter()
        .map(|b| b.title)
        .collect();
    assert_eq!(titles, vec!["Apple", "banana", "Cherry"]);
}

#[test]
fn list_books_filters_on_title_or_author() {
    let dir = TempDir::new().unwrap();
    let library = Library::new(dir.path(), 20);

    let mut by_author = record("Unrelated", &["c.html"]);
    by_author.metadata.authors = vec!["Ursula Vance".to_string()];
    seed(library.store(), "A_data", &by_author);
    seed(library.store(), "B_data", &record("Deep Winter", &["c.html"]));

    assert_eq!(library.list_books(Some("winter")).len(), 1);
    assert_eq!(library.list_books(Some("VANCE")).len(), 1);
    assert_eq!(library.list_books(Some("zz-no-match")).len(), 0);
}

#[test]
fn list_books_skips_corrupt_entries() {
    let dir = TempDir::new().unwrap();
    let library = Library::new(dir.path(), 20);

    seed(library.store(), "Good_data", &record("Good", &["c.html"]));
    let broken = dir.path().join("Bad_data");
    std::fs::create_dir_all(&broken).unwrap();
    std::fs::write(broken.join("book.json"), b"{truncated").unwrap();

    let books = library.list_books(None);
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].title, "Good");
}

#[test]
fn list_books_ignores_foreign_directories() {
    let dir = TempDir::new().unwrap();
    let library = Library::new(dir.path(), 20);

    seed(library.store(), "Good_data", &record("Good", &["c.html"]));
    std::fs::create_dir_all(dir.path().join("not-a-book")).unwrap();

    assert_eq!(library.list_books(None).len(), 1);
}

#[test]
fn cover_prefers_cover_substring_then_first_image() {
    let dir = TempDir::new().unwrap();
    let library = Library::new(dir.path(), 20);
    seed(library.store(), "A_data", &record("A", &["c.html"]));

    let images = dir.path().join("A_data/images");
    std::fs::create_dir_all(&images).unwrap();
    std::fs::write(images.join("zebra.png"), b"png").unwrap();
    std::fs::write(images.join("MyCover.jpg"), b"jpg").unwrap();

    assert_eq!(
        library.cover_url("A_data").unwrap(),
        "/library/A_data/cover/MyCover.jpg"
    );

    std::fs::remove_file(images.join("MyCover.jpg")).unwrap();
    std::fs::write(images.join("art.png"), b"png").unwrap();
    assert_eq!(
        library.cover_url("A_data").unwrap(),
        "/library/A_data/cover/art.png"
    );
}

#[test]
fn cover_absent_without_images() {
    let dir = TempDir::new().unwrap();
    let library = Library::new(dir.path(), 20);
    seed(library.store(), "A_data", &record("A", &["c.html"]));

    assert!(library.cover_url("A_data").is_none());

    std::fs::create_dir_all(dir.path().join("A_data/images")).unwrap();
    assert!(library.cover_url("A_data").is_none());
}

// ============================================================================
// DELETION
// ============================================================================

#[test]
fn delete_removes_book_everywhere() {
    let dir = TempDir::new().unwrap();
    let library = Library::new(dir.path(), 20);

    seed(library.store(), "A_data", &record("A", &["c.html"]));
    library.load("A_data").unwrap();

    library.delete_book("A_data").unwrap();
    assert!(library.load("A_data").is_none());
    assert!(library.list_books(None).is_empty());
}

#[test]
fn delete_missing_book_is_not_found() {
    let dir = TempDir::new().unwrap();
    let library = Library::new(dir.path(), 20);

    assert!(matches!(
        library.delete_book("Ghost_data"),
        Err(AppError::NotFound(_))
    ));
}

// ============================================================================
// TRANSLATION
// ============================================================================

#[test]
fn provider_parse_is_closed() {
    assert_eq!(Provider::parse("zai").unwrap(), Provider::Zai);
    assert_eq!(Provider::parse("google").unwrap(), Provider::Google);
    assert!(matches!(
        Provider::parse("bogus"),
        Err(AppError::InvalidProvider(_))
    ));
}

#[test]
fn translate_bogus_provider_fails_before_any_network() {
    let req = TranslateRequest {
        text: "hello".to_string(),
        target_lang: "id".to_string(),
        source_lang: "auto".to_string(),
        provider: "bogus".to_string(),
    };

    let result = tokio_test::block_on(translate(&req));
    assert!(matches!(result, Err(AppError::InvalidProvider(_))));
}

#[test]
fn translate_request_defaults() {
    let req: TranslateRequest = serde_json::from_str(r#"{"text": "hi"}"#).unwrap();
    assert_eq!(req.target_lang, "id");
    assert_eq!(req.source_lang, "auto");
    assert_eq!(req.provider, "zai");
}

#[test]
fn language_table_falls_through_unknown_codes() {
    assert_eq!(language_name("id"), "Indonesian");
    assert_eq!(language_name("fr"), "French");
    assert_eq!(language_name("xx-YY"), "xx-YY");
}

// ============================================================================
// CONFIG
// ============================================================================

#[test]
fn config_parse_toml() {
    let toml = r#"
[server]
bind = "127.0.0.1:9090"
title = "Test Library"

[library]
root = "/tmp/books"

[cache]
capacity = 5
"#;
    let config: Config = toml::from_str(toml).unwrap();
    assert_eq!(config.server.bind.port(), 9090);
    assert_eq!(config.server.title, "Test Library");
    assert_eq!(config.library.root, std::path::PathBuf::from("/tmp/books"));
    assert_eq!(config.cache.capacity, 5);
}

#[test]
fn config_default_values() {
    let config = Config::default();
    assert_eq!(config.server.bind.port(), 8123);
    assert_eq!(config.library.root, std::path::PathBuf::from("My-Library"));
    assert_eq!(config.cache.capacity, 20);
}
