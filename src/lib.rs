//! shelfside: a personal EPUB library server for in-browser reading.
//!
//! This crate serves a library of pre-processed EPUBs chapter by chapter,
//! ingests uploaded archives into a directory-per-book storage layout, and
//! proxies text translation to external providers.
//!
//! # Features
//!
//! - Bounded in-memory cache of parsed book records with LRU eviction
//! - Chapter navigation by spine index or href token
//! - EPUB upload, parsing and image extraction
//! - Library listing with search, sort and cover heuristics
//! - Translation proxy (Z.ai or Google Translate)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Configuration and CLI.
pub mod config;
/// Error types.
pub mod error;
/// Archive parsers.
pub mod formats;
/// Upload ingestion pipeline.
pub mod ingest;
/// Library storage, cache and models.
pub mod library;
/// HTTP server.
pub mod server;
/// Translation gateway.
pub mod translate;

#[cfg(test)]
mod tests;

pub use config::{Cli, Command, Config};
pub use error::{AppError, Result};
pub use library::Library;
pub use server::AppState;
