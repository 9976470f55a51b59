mod epub;

pub use epub::EpubParser;

use crate::error::Result;
use crate::library::book::BookRecord;
use std::path::Path;

/// Capability interface for turning a staged archive into a book record.
///
/// Implementations materialize the on-disk layout as a side effect
/// (extracted images under `out_dir/images`) and return the parsed record.
/// Failure modes: malformed archive, missing required document — both
/// surface as errors, never panics. Tests substitute a mock implementation.
pub trait BookParser: Send + Sync {
    /// Parse the archive at `archive_path`, extracting assets into `out_dir`.
    fn parse(&self, archive_path: &Path, out_dir: &Path) -> Result<BookRecord>;
}
