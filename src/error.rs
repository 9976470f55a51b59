use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Main error type for the application.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found error.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Chapter index outside the spine bounds.
    #[error("Chapter index out of range: {index} (spine has {len} chapters)")]
    OutOfRange {
        /// Requested spine index.
        index: i64,
        /// Spine length of the book.
        len: usize,
    },

    /// Upload with an unexpected file extension.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The archive parser rejected the uploaded file.
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),

    /// Unknown translation provider.
    #[error("Invalid provider: {0}. Use 'zai' or 'google'")]
    InvalidProvider(String),

    /// Required environment configuration is absent.
    #[error("Configuration missing: {0}")]
    ConfigMissing(String),

    /// Translation provider transport or response-shape failure.
    #[error("Translation failed: {0}")]
    Translation(String),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP archive error.
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// XML parsing error.
    #[error("XML parsing error: {0}")]
    Xml(#[from] roxmltree::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) | AppError::OutOfRange { .. } => StatusCode::NOT_FOUND,
            AppError::UnsupportedFormat(_) | AppError::InvalidProvider(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        tracing::error!(error = %self, "Request error");

        let body = axum::Json(serde_json::json!({
            "success": false,
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

/// Result type alias for the application.
pub type Result<T> = std::result::Result<T, AppError>;
