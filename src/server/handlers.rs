//! HTTP request handlers.

use crate::error::{AppError, Result};
use crate::ingest;
use crate::library::book::BookSummary;
use crate::library::chapter;
use crate::server::AppState;
use axum::{
    Json,
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::{StatusCode, header},
    response::{Html, Response},
};
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;

// ============================================================================
// LIBRARY
// ============================================================================

/// Query parameters for the library listing.
#[derive(Debug, Deserialize)]
pub struct LibraryQuery {
    /// Optional case-insensitive substring filter on title or author.
    pub search: Option<String>,
}

/// List all processed books, optionally filtered.
pub async fn library_view(
    State(state): State<AppState>,
    Query(params): Query<LibraryQuery>,
) -> Result<Json<Vec<BookSummary>>> {
    let books = tokio::task::spawn_blocking(move || {
        state.library.list_books(params.search.as_deref())
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(books))
}

// ============================================================================
// READER
// ============================================================================

/// Shorthand entry point: chapter 0.
pub async fn read_book_start(
    State(state): State<AppState>,
    Path(book_id): Path<String>,
) -> Result<Html<String>> {
    read_chapter_impl(state, book_id, "0".to_string()).await
}

/// Render one chapter by spine index or href token.
pub async fn read_chapter(
    State(state): State<AppState>,
    Path((book_id, chapter_ref)): Path<(String, String)>,
) -> Result<Html<String>> {
    read_chapter_impl(state, book_id, chapter_ref).await
}

async fn read_chapter_impl(
    state: AppState,
    book_id: String,
    chapter_ref: String,
) -> Result<Html<String>> {
    let library = state.library.clone();
    let id = book_id.clone();
    let book = tokio::task::spawn_blocking(move || library.load(&id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .ok_or_else(|| AppError::NotFound(format!("Book not found: {}", book_id)))?;

    let position = chapter::resolve(&book, &chapter_ref)?;
    let current = &book.spine[position.index];

    let prev_link = position
        .prev
        .map(|i| format!(r#"<a href="/read/{}/{}">&larr; Previous</a>"#, book_id, i))
        .unwrap_or_default();
    let next_link = position
        .next
        .map(|i| format!(r#"<a href="/read/{}/{}">Next &rarr;</a>"#, book_id, i))
        .unwrap_or_default();

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title} - Chapter {index}</title>
    <style>
        body {{ font-family: Georgia, serif; max-width: 720px; margin: 2rem auto; padding: 0 1rem; line-height: 1.6; }}
        nav {{ display: flex; justify-content: space-between; padding: 1rem 0; border-bottom: 1px solid #ddd; }}
        nav a {{ color: #0066cc; text-decoration: none; }}
        img {{ max-width: 100%; }}
    </style>
</head>
<body>
    <nav>
        <span>{prev}</span>
        <a href="/">{title}</a>
        <span>{next}</span>
    </nav>
    <main>{content}</main>
    <nav>
        <span>{prev}</span>
        <span>{index_display} / {total}</span>
        <span>{next}</span>
    </nav>
</body>
</html>"#,
        title = book.metadata.title,
        index = position.index,
        index_display = position.index + 1,
        total = book.spine.len(),
        prev = prev_link,
        next = next_link,
        content = current.content,
    );

    Ok(Html(html))
}

// ============================================================================
// IMAGES
// ============================================================================

/// Serve an image referenced from chapter content.
///
/// Chapter HTML carries `<img src="images/pic.jpg">`, which the browser
/// resolves to `/read/{book_id}/images/pic.jpg`.
pub async fn serve_image(
    State(state): State<AppState>,
    Path((book_id, image_name)): Path<(String, String)>,
) -> Result<Response<Body>> {
    serve_book_image(state, book_id, image_name).await
}

/// Serve a cover image for the library view.
pub async fn serve_cover(
    State(state): State<AppState>,
    Path((book_id, image_name)): Path<(String, String)>,
) -> Result<Response<Body>> {
    serve_book_image(state, book_id, image_name).await
}

async fn serve_book_image(
    state: AppState,
    book_id: String,
    image_name: String,
) -> Result<Response<Body>> {
    // Both components are reduced to base names inside image_path.
    let path = state.library.image_path(&book_id, &image_name);

    if !path.is_file() {
        return Err(AppError::NotFound(format!("Image not found: {}", image_name)));
    }

    let file = tokio::fs::File::open(&path).await?;
    let stream = ReaderStream::new(file);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, image_mime(&image_name))
        .header(header::CACHE_CONTROL, "public, max-age=86400")
        .body(Body::from_stream(stream))
        .map_err(|e| AppError::Internal(e.to_string()))
}

/// Guess an image MIME type from the filename extension.
fn image_mime(name: &str) -> &'static str {
    match name.rsplit_once('.').map(|(_, ext)| ext.to_lowercase()) {
        Some(ext) if ext == "jpg" || ext == "jpeg" => "image/jpeg",
        Some(ext) if ext == "png" => "image/png",
        Some(ext) if ext == "gif" => "image/gif",
        Some(ext) if ext == "webp" => "image/webp",
        Some(ext) if ext == "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

// ============================================================================
// UPLOAD / DELETE
// ============================================================================

/// Upload response.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Always true on the success path.
    pub success: bool,
    /// Human-readable outcome message.
    pub message: String,
    /// Generated library identifier.
    pub book_id: String,
    /// Parsed book title.
    pub title: String,
    /// Number of spine chapters.
    pub chapters: usize,
}

/// Upload and process an EPUB file (multipart form, field "file").
pub async fn upload_book(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let mut upload: Option<(String, axum::body::Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    {
        if let Some(filename) = field.file_name().map(String::from) {
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::Internal(e.to_string()))?;
            upload = Some((filename, data));
            break;
        }
    }

    let (filename, data) = upload
        .ok_or_else(|| AppError::UnsupportedFormat("No file in upload".into()))?;

    let library = state.library.clone();
    let parser = state.parser.clone();
    let summary = tokio::task::spawn_blocking(move || {
        ingest::ingest(&library, parser.as_ref(), &filename, &data)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(Json(UploadResponse {
        success: true,
        message: format!(
            "Book '{}' uploaded and processed successfully!",
            summary.title
        ),
        book_id: summary.id,
        title: summary.title,
        chapters: summary.chapters,
    }))
}

/// Delete response.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    /// Always true on the success path.
    pub success: bool,
    /// Human-readable outcome message.
    pub message: String,
}

/// Delete a book folder and its cache entry.
pub async fn delete_book(
    State(state): State<AppState>,
    Path(book_id): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let library = state.library.clone();
    tokio::task::spawn_blocking(move || library.delete_book(&book_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(Json(DeleteResponse {
        success: true,
        message: "Book deleted successfully".to_string(),
    }))
}

// ============================================================================
// TRANSLATION
// ============================================================================

/// Proxy one translation request to the selected provider.
pub async fn translate_text(
    Json(req): Json<crate::translate::TranslateRequest>,
) -> Result<Json<crate::translate::TranslateResponse>> {
    let response = crate::translate::translate(&req).await?;
    Ok(Json(response))
}
