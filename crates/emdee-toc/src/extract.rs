//! Table of contents entries read back from rendered HTML.

use emdee_view::{DocumentView, Heading};

/// Deepest heading level listed in the table of contents by default.
pub const DEFAULT_MAX_LEVEL: u8 = 4;

/// Headings h1-h4 of `html` that carry an `id`, in document order.
///
/// Returns an empty list when the markup cannot be scanned.
pub fn extract_headings(html: &str) -> Vec<Heading> {
    extract_headings_up_to(html, DEFAULT_MAX_LEVEL)
}

/// Like [`extract_headings`], listing levels up to `max_level`.
pub fn extract_headings_up_to(html: &str, max_level: u8) -> Vec<Heading> {
    match DocumentView::parse(html) {
        Ok(view) => headings_from_view(&view, max_level),
        Err(e) => {
            tracing::warn!(error = %e, "Could not scan rendered HTML for headings");
            Vec::new()
        }
    }
}

/// Table-of-contents entries of an already scanned view.
pub fn headings_from_view(view: &DocumentView, max_level: u8) -> Vec<Heading> {
    view.headings()
        .iter()
        .filter(|heading| heading.level <= max_level)
        .map(|heading| Heading::new(&*heading.id, display_text(&heading.text), heading.level))
        .collect()
}

/// Trim the label and drop a stray permalink glyph.
///
/// Generated permalinks are already excluded by the view. A heading from raw
/// HTML may still end in a detached ` #`; a `#` attached to a word ("C#") is
/// part of the label.
fn display_text(text: &str) -> String {
    let trimmed = text.trim();
    match trimmed.strip_suffix('#') {
        Some(rest) if rest.ends_with(char::is_whitespace) => rest.trim_end().to_owned(),
        _ => trimmed.to_owned(),
    }
}
