//! Word count and reading time.

/// Words per minute used for the reading-time estimate.
pub const WORDS_PER_MINUTE: usize = 200;

/// Reading statistics of a document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReadingStats {
    pub words: usize,
    /// Estimated minutes, at least one.
    pub minutes: usize,
}

/// Count whitespace-separated words. `None` for blank text.
pub fn reading_stats(text: &str) -> Option<ReadingStats> {
    let words = text.split_whitespace().count();
    if words == 0 {
        return None;
    }
    // Round half up.
    let minutes = ((words + WORDS_PER_MINUTE / 2) / WORDS_PER_MINUTE).max(1);
    Some(ReadingStats { words, minutes })
}
