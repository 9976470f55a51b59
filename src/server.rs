//! HTTP server and routes.

mod handlers;
mod state;

pub use state::AppState;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Whole uploads are buffered, so the body limit bounds archive size.
const MAX_UPLOAD_BYTES: usize = 256 * 1024 * 1024;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::library_view))
        .route("/read/{book_id}", get(handlers::read_book_start))
        .route("/read/{book_id}/{chapter_ref}", get(handlers::read_chapter))
        .route(
            "/read/{book_id}/images/{image_name}",
            get(handlers::serve_image),
        )
        .route(
            "/library/{book_id}/cover/{image_name}",
            get(handlers::serve_cover),
        )
        .route("/library/{book_id}", delete(handlers::delete_book))
        .route(
            "/upload",
            post(handlers::upload_book).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/api/translate", post(handlers::translate_text))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
