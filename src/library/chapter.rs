//! Chapter reference resolution and prev/next navigation.

use crate::error::{AppError, Result};
use crate::library::book::BookRecord;

/// A resolved position within a book's spine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChapterPosition {
    /// Spine index of the resolved chapter.
    pub index: usize,

    /// Previous spine index, absent at the first chapter.
    pub prev: Option<usize>,

    /// Next spine index, absent at the last chapter.
    pub next: Option<usize>,
}

/// Resolve a chapter reference against a book's spine.
///
/// A reference that parses as a non-negative integer is a direct spine
/// index. Anything else is an href token: an exact match against a spine
/// entry's `href` wins, otherwise the first entry whose `href` ends with the
/// token (reader links often carry a bare filename where the stored href is
/// a full relative path). Spine order breaks ties.
pub fn resolve(book: &BookRecord, chapter_ref: &str) -> Result<ChapterPosition> {
    let len = book.spine.len();

    let index = match chapter_ref.parse::<i64>() {
        Ok(index) => {
            if index < 0 || index as usize >= len {
                return Err(AppError::OutOfRange { index, len });
            }
            index as usize
        }
        Err(_) => book
            .spine
            .iter()
            .position(|ch| ch.href == chapter_ref)
            .or_else(|| {
                book.spine
                    .iter()
                    .position(|ch| ch.href.ends_with(chapter_ref))
            })
            .ok_or_else(|| {
                AppError::NotFound(format!("Chapter with filename '{}' not found", chapter_ref))
            })?,
    };

    Ok(ChapterPosition {
        index,
        prev: (index > 0).then(|| index - 1),
        next: (index + 1 < len).then_some(index + 1),
    })
}
