//! Application state shared across handlers.

use crate::config::Config;
use crate::formats::{BookParser, EpubParser};
use crate::library::Library;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<Config>,
    /// Library service (store + record cache).
    pub library: Arc<Library>,
    /// Archive parser used by the ingestion pipeline.
    pub parser: Arc<dyn BookParser>,
}

impl AppState {
    /// Create application state with the production EPUB parser.
    pub fn new(config: Config) -> Self {
        Self::with_parser(config, Arc::new(EpubParser))
    }

    /// Create application state with an explicit parser.
    pub fn with_parser(config: Config, parser: Arc<dyn BookParser>) -> Self {
        let library = Library::new(config.library.root.clone(), config.cache.capacity);
        Self {
            config: Arc::new(config),
            library: Arc::new(library),
            parser,
        }
    }
}
